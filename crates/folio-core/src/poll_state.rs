//! State published by a poller after every refresh cycle.
//!
//! `PollState` is owned by exactly one poller task; everything else sees
//! cloned snapshots. The transition methods below are the only way the
//! state changes, and a cancelled cycle never leaves a trace in it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backoff::{RetryDecision, RetryPolicy};
use crate::error::RefreshError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

/// Last surfaced failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub error: RefreshError,
    pub at: DateTime<Utc>,
    /// Delay until the scheduled automatic retry, if one is scheduled.
    pub next_retry_ms: Option<u64>,
    /// Retries are exhausted; only the regular interval (or a manual retry)
    /// will refresh again.
    pub gave_up: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollState<T> {
    pub last_value: Option<T>,
    pub last_error: Option<ErrorInfo>,
    pub is_loading: bool,
    /// Automatic retries scheduled since the last success.
    pub retry_count: u32,
    pub phase: PollPhase,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            last_value: None,
            last_error: None,
            is_loading: false,
            retry_count: 0,
            phase: PollPhase::Idle,
            updated_at: None,
            last_success_at: None,
        }
    }
}

impl<T> PollState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A refresh cycle started.
    pub fn begin(&mut self, now: DateTime<Utc>) {
        self.is_loading = true;
        self.phase = PollPhase::Loading;
        self.updated_at = Some(now);
    }

    /// The cycle resolved. The value replaces the previous one wholesale
    /// and the retry schedule starts over.
    pub fn record_success(&mut self, value: T, now: DateTime<Utc>) {
        self.last_value = Some(value);
        self.last_error = None;
        self.is_loading = false;
        self.retry_count = 0;
        self.phase = PollPhase::Success;
        self.updated_at = Some(now);
        self.last_success_at = Some(now);
    }

    /// The cycle failed. The previous value is kept so consumers can keep
    /// rendering stale data next to the error.
    ///
    /// Returns the retry decision when a policy applies. A cancelled cycle
    /// is abandoned instead and yields `None`.
    pub fn record_failure(
        &mut self,
        error: RefreshError,
        policy: Option<&RetryPolicy>,
        now: DateTime<Utc>,
    ) -> Option<RetryDecision> {
        if error.is_cancelled() {
            self.abandon();
            return None;
        }

        let decision = policy.map(|p| p.on_failure(self.retry_count));
        let (next_retry_ms, gave_up) = match decision {
            Some(RetryDecision::Retry(delay)) => {
                self.retry_count = self.retry_count.saturating_add(1);
                (Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)), false)
            }
            Some(RetryDecision::GiveUp) => (None, true),
            None => (None, false),
        };

        self.last_error = Some(ErrorInfo {
            error,
            at: now,
            next_retry_ms,
            gave_up,
        });
        self.is_loading = false;
        self.phase = PollPhase::Failed;
        self.updated_at = Some(now);
        decision
    }

    /// Drop an in-flight cycle without recording an outcome.
    pub fn abandon(&mut self) {
        self.is_loading = false;
        self.phase = self.settled_phase();
    }

    /// Manual retry: the automatic schedule starts over from attempt 0.
    pub fn reset_retries(&mut self) {
        self.retry_count = 0;
        if let Some(info) = self.last_error.as_mut() {
            info.gave_up = false;
            info.next_retry_ms = None;
        }
    }

    pub fn has_given_up(&self) -> bool {
        self.last_error.as_ref().is_some_and(|e| e.gave_up)
    }

    fn settled_phase(&self) -> PollPhase {
        if self.last_error.is_some() {
            PollPhase::Failed
        } else if self.last_value.is_some() {
            PollPhase::Success
        } else {
            PollPhase::Idle
        }
    }
}
