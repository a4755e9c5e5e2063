//! Bounded retry policy with fixed backoff.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of inbox attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts (mail delivery latency)
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5_000;

/// Explicit attempt budget with a fixed delay between attempts.
///
/// The delay is applied between attempts only, never after the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay between attempts in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with `max_attempts` and a fixed delay
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay_ms: delay.as_millis() as u64,
        }
    }

    /// Set maximum attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay between attempts
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = delay.as_millis() as u64;
        self
    }

    /// Attempts actually made; a zero budget still gets one attempt
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay as Duration
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Whether another attempt follows `attempt` (1-based)
    #[must_use]
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.attempts()
    }
}
