//! Dispatcher configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Receipt polling settings for write-mode dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Delay between `eth_getTransactionReceipt` polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up waiting for a receipt after this long, in milliseconds
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 { 500 }
fn default_receipt_timeout_ms() -> u64 { 120_000 }

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            receipt_timeout_ms: default_receipt_timeout_ms(),
        }
    }
}

impl DispatchConfig {
    /// Fast polling for local dev nodes and tests.
    pub fn local() -> Self {
        Self { poll_interval_ms: 10, receipt_timeout_ms: 5_000 }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms)
    }
}
