//! # chaincontract-http
//!
//! A [`ChainTransport`](chaincontract_core::ChainTransport) that talks
//! JSON-RPC over HTTP, with exponential backoff for transient failures.
//!
//! ```rust,no_run
//! use chaincontract_http::HttpTransport;
//!
//! let transport = HttpTransport::default_for("http://127.0.0.1:8545").unwrap();
//! ```

pub mod client;
pub mod retry;
pub mod wire;

pub use client::{HttpTransport, HttpTransportConfig};
pub use retry::{RetryConfig, RetryPolicy};
