//! Exponential backoff for transient transport failures.
//!
//! Only connection errors and timeouts are retried; a JSON-RPC error object
//! (including an execution revert) is an answer, not a failure.

use std::time::Duration;

/// Backoff settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// Cap on a single delay.
    pub max_backoff: Duration,
    pub multiplier: f64,
    /// Extra delay as a fraction of the backoff, spread over attempts.
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter_fraction: 0.1,
        }
    }
}

impl RetryConfig {
    /// Fail on the first error.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }
}

/// Computes the delay before each retry from the attempt number alone.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Delay before retry number `attempt` (1-based), or `None` once the
    /// retries are used up.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.config.max_retries {
            return None;
        }
        let base_ms = self.config.initial_backoff.as_millis() as f64
            * self.config.multiplier.powi(attempt as i32 - 1);
        let capped = base_ms.min(self.config.max_backoff.as_millis() as f64);

        // Odd attempts get the full jitter, even ones half of it, so two
        // clients started together drift apart without a random source.
        let spread = if attempt % 2 == 1 { 1.0 } else { 0.5 };
        let jitter = capped * self.config.jitter_fraction * spread;
        Some(Duration::from_millis((capped + jitter) as u64))
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.config.max_retries
    }
}
