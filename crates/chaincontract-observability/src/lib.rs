//! # chaincontract-observability
//!
//! Logging setup shared by ChainContract binaries. Library crates only emit
//! `tracing` events; installing a subscriber is left to the application.
//!
//! Components log under their crate targets (`chaincontract_client`,
//! `chaincontract_http`, ...), so per-component levels are plain
//! `EnvFilter` directives.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};
