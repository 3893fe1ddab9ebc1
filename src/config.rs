//! Polling configuration for the asynchronous queries.

use std::time::Duration;

/// Default async-query timeout in milliseconds.
pub const DEFAULT_FIND_TIMEOUT_MS: u64 = 1000;
/// Default interval between poll ticks in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 25;

pub const ENV_FIND_TIMEOUT_MS: &str = "MOCKSTAGE_FIND_TIMEOUT_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "MOCKSTAGE_POLL_INTERVAL_MS";

/// Bounds for the `find_*` retry loop: how long to keep polling and how long
/// to sleep between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_FIND_TIMEOUT_MS),
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl PollConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Defaults, with `MOCKSTAGE_FIND_TIMEOUT_MS` / `MOCKSTAGE_POLL_INTERVAL_MS`
    /// overrides applied when set and parseable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var(ENV_FIND_TIMEOUT_MS) {
            if let Ok(ms) = raw.parse::<u64>() {
                cfg.timeout = Duration::from_millis(ms);
            }
        }
        if let Ok(raw) = std::env::var(ENV_POLL_INTERVAL_MS) {
            if let Ok(ms) = raw.parse::<u64>() {
                cfg.interval = Duration::from_millis(ms);
            }
        }
        cfg
    }
}
