//! Retry schedule applied after a failed refresh.
//!
//! Retries are a side schedule on top of a poller's fixed interval: the
//! policy only answers how long to wait before the next attempt, or that
//! automatic retrying should stop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

/// Exponential backoff: attempt `n` (0-indexed) waits `2^n * base_delay_ms`.
/// Attempts at or beyond `max_attempts` give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub base_delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn on_failure(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        let factor = 2u64.saturating_pow(attempt);
        RetryDecision::Retry(Duration::from_millis(
            self.base_delay_ms.saturating_mul(factor),
        ))
    }
}
