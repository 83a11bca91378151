//! # chaincontract-client
//!
//! Contract handles, call dispatch, deterministic deployment and Multicall3
//! batching on top of `chaincontract-abi`.
//!
//! All I/O goes through a borrowed [`ChainTransport`](chaincontract_core::ChainTransport);
//! nothing here owns a connection or spawns tasks.
//!
//! ## Quick start
//! ```rust,ignore
//! use chaincontract_client::{builtins, Contract, Dispatcher};
//!
//! let token = Contract::new(token_address, builtins::erc20()?);
//! let balance = token
//!     .call(&transport, &Dispatcher::default(), "balanceOf", &[owner.into()])
//!     .await?;
//! ```

pub mod artifact;
pub mod builtins;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod dispatcher;
pub mod multicall;
pub mod signer;
pub mod slots;
pub mod tx;

pub use artifact::{parse_cli_arg, Artifact};
pub use config::DispatchConfig;
pub use contract::Contract;
pub use deploy::{compute_address, deploy, DeployScheme};
pub use dispatcher::{CallMode, Dispatched, Dispatcher};
pub use multicall::{aggregate, Call3, Call3Value, CallResult};
pub use signer::{recover_signer, LocalAccount};
pub use slots::{MappingSlot, SlotLayout};
