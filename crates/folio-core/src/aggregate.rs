//! Settle-all result of fetching every subject in a roster.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{FetchError, RefreshError};
use crate::presence::PresenceSubject;
use crate::roster::Roster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateStatus {
    PartialOrFullSuccess,
    Failed,
}

/// A subject that did not resolve in this batch. It is not retried on its
/// own; the next aggregate refresh tries it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectFailure {
    pub id: String,
    pub error: FetchError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub subjects: HashMap<String, PresenceSubject>,
    pub failures: Vec<SubjectFailure>,
}

impl AggregateResult {
    /// Fold per-subject outcomes. Failed subjects contribute no entry to
    /// the mapping.
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (String, Result<PresenceSubject, FetchError>)>,
    {
        let mut result = Self::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(subject) => {
                    result.subjects.insert(id, subject);
                }
                Err(error) => result.failures.push(SubjectFailure { id, error }),
            }
        }
        result
    }

    pub fn had_success(&self) -> bool {
        !self.subjects.is_empty()
    }

    pub fn status(&self) -> AggregateStatus {
        if self.had_success() {
            AggregateStatus::PartialOrFullSuccess
        } else {
            AggregateStatus::Failed
        }
    }

    pub fn attempted(&self) -> usize {
        self.subjects.len() + self.failures.len()
    }

    /// True when the shared cancel token fired before the batch settled.
    pub fn was_cancelled(&self) -> bool {
        self.failures.iter().any(|f| f.error.is_cancelled())
    }

    /// Interpret the batch as one refresh cycle: cancelled batches are
    /// dropped, a batch where nothing resolved is a failure.
    pub fn into_refresh(self) -> Result<Self, RefreshError> {
        if self.was_cancelled() {
            return Err(FetchError::Cancelled.into());
        }
        match self.status() {
            AggregateStatus::PartialOrFullSuccess => Ok(self),
            AggregateStatus::Failed => Err(RefreshError::NoneResolved {
                attempted: self.attempted(),
            }),
        }
    }

    /// Subjects in roster order, `None` for those that did not resolve.
    pub fn in_roster_order<'a>(
        &'a self,
        roster: &'a Roster,
    ) -> impl Iterator<Item = (&'a str, Option<&'a PresenceSubject>)> + 'a {
        roster.iter().map(move |id| (id, self.subjects.get(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::OnlineStatus;

    fn subject(id: &str) -> PresenceSubject {
        PresenceSubject {
            id: id.to_string(),
            status: OnlineStatus::Online,
            avatar: None,
            display_name: format!("user-{id}"),
            activity: None,
            custom_status: None,
            spotify: None,
        }
    }

    fn ok(id: &str) -> (String, Result<PresenceSubject, FetchError>) {
        (id.to_string(), Ok(subject(id)))
    }

    fn err(id: &str, e: FetchError) -> (String, Result<PresenceSubject, FetchError>) {
        (id.to_string(), Err(e))
    }

    #[test]
    fn partial_failure_is_success() {
        let result = AggregateResult::from_outcomes([
            ok("A"),
            err("B", FetchError::HttpStatus(500)),
            ok("C"),
        ]);
        let mut keys: Vec<&str> = result.subjects.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["A", "C"]);
        assert_eq!(result.status(), AggregateStatus::PartialOrFullSuccess);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].id, "B");
        assert!(result.into_refresh().is_ok());
    }

    #[test]
    fn total_failure() {
        let result = AggregateResult::from_outcomes([
            err("A", FetchError::Transport("dns".into())),
            err("B", FetchError::HttpStatus(429)),
            err("C", FetchError::Malformed("eof".into())),
        ]);
        assert!(result.subjects.is_empty());
        assert_eq!(result.status(), AggregateStatus::Failed);
        assert_eq!(
            result.into_refresh(),
            Err(RefreshError::NoneResolved { attempted: 3 })
        );
    }

    #[test]
    fn cancelled_batch_is_cancelled_even_with_successes() {
        let result = AggregateResult::from_outcomes([ok("A"), err("B", FetchError::Cancelled)]);
        assert!(result.was_cancelled());
        assert!(result.into_refresh().unwrap_err().is_cancelled());
    }

    #[test]
    fn empty_batch_is_failed() {
        let result = AggregateResult::from_outcomes(Vec::new());
        assert_eq!(result.status(), AggregateStatus::Failed);
        assert_eq!(result.attempted(), 0);
    }

    #[test]
    fn roster_order_with_placeholders() {
        let roster = Roster::new(["A", "B", "C"]).expect("roster");
        let result =
            AggregateResult::from_outcomes([ok("C"), err("B", FetchError::HttpStatus(404)), ok("A")]);
        let view: Vec<(&str, bool)> = result
            .in_roster_order(&roster)
            .map(|(id, s)| (id, s.is_some()))
            .collect();
        assert_eq!(view, vec![("A", true), ("B", false), ("C", true)]);
    }
}
