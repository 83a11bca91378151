//! # chaincontract-core
//!
//! Shared primitives for ChainContract: the [`AbiValue`] value model, the
//! [`ContractError`] taxonomy, chain data types and the [`ChainTransport`]
//! trait every I/O operation is written against.

pub mod chain;
pub mod error;
pub mod request;
pub mod revert;
pub mod transport;
pub mod types;

pub use chain::{BlockTag, LogFilter, RawLog, Receipt, TxRequest};
pub use error::{ContractError, TransportError};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use revert::{panic_meaning, RevertReason, ERROR_STRING_SELECTOR, PANIC_SELECTOR};
pub use transport::ChainTransport;
pub use types::AbiValue;

/// Re-exported so downstream crates agree on primitive types.
pub use alloy_primitives::{Address, Bytes, B256, I256, U256};
