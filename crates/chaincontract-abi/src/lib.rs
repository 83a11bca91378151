//! # chaincontract-abi
//!
//! ABI handling for ChainContract: parse once, encode and decode many times.
//!
//! ## Implementation notes
//! - Uses `alloy-json-abi` for the ABI model and `alloy-dyn-abi` for codec work
//! - Sources: JSON ABI arrays, compiler artifacts and human-readable signatures,
//!   including the compact `balanceOf(address)(uint256)` form
//! - [`parse`] memoizes descriptors process-wide, keyed by keccak of the source
//! - Overloads are ranked by argument compatibility; ties are an error, never a guess

pub mod cache;
pub mod call;
pub mod coerce;
pub mod descriptor;
pub mod hash;
pub mod human;
pub mod log;
pub mod normalizer;
pub mod revert;

pub use cache::{parse, AbiCache, AbiSource};
pub use call::{DecodedResult, EncodedCall};
pub use descriptor::{ConstructorEntry, ContractDescriptor, ErrorEntry, EventEntry, FunctionEntry};
pub use hash::{event_topic, keccak256, selector};
pub use human::parse_human_readable;
pub use log::DecodedLog;
pub use revert::decode_revert;

pub use alloy_dyn_abi::{DynSolType, DynSolValue};
pub use alloy_json_abi::JsonAbi;
