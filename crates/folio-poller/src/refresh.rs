//! Refresh functions wiring the clients into pollers.

use std::sync::Arc;

use folio_client::{HttpTransport, PresenceClient, WeatherClient};
use folio_core::{AggregateResult, Forecast, PresenceSubject, RefreshError, Roster, WeatherQuery};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::aggregate::refresh_all;

pub type RefreshFn<T> =
    Box<dyn FnMut(CancellationToken) -> BoxFuture<'static, Result<T, RefreshError>> + Send>;

/// Single-subject presence refresh (the profile).
pub fn presence<T>(client: Arc<PresenceClient<T>>, subject_id: String) -> RefreshFn<PresenceSubject>
where
    T: HttpTransport + 'static,
{
    Box::new(move |cancel| {
        let client = Arc::clone(&client);
        let id = subject_id.clone();
        async move {
            client
                .fetch_presence(&id, &cancel)
                .await
                .map_err(RefreshError::from)
        }
        .boxed()
    })
}

/// Whole-roster refresh (the friends list). Succeeds when at least one
/// subject resolved.
pub fn roster<T>(client: Arc<PresenceClient<T>>, roster: Roster) -> RefreshFn<AggregateResult>
where
    T: HttpTransport + 'static,
{
    Box::new(move |cancel| {
        let client = Arc::clone(&client);
        let roster = roster.clone();
        async move {
            refresh_all(&client, roster.ids(), &cancel)
                .await
                .into_refresh()
        }
        .boxed()
    })
}

pub fn forecast<T>(client: Arc<WeatherClient<T>>, query: WeatherQuery) -> RefreshFn<Forecast>
where
    T: HttpTransport + 'static,
{
    Box::new(move |cancel| {
        let client = Arc::clone(&client);
        let query = query.clone();
        async move {
            client
                .fetch_forecast(&query, &cancel)
                .await
                .map_err(RefreshError::from)
        }
        .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{BASE, RosterTransport};
    use crate::poller::{PollerConfig, start};
    use folio_core::{PollPhase, RetryPolicy};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn profile_poller_resolves_subject() {
        let client = Arc::new(PresenceClient::new(
            RosterTransport::default().online("42", Duration::ZERO),
            BASE,
        ));
        let handle = start(
            PollerConfig::new("profile", Duration::from_secs(5)),
            presence(client, "42".to_string()),
        );
        sleep(Duration::from_millis(10)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.last_value.map(|s| s.id).as_deref(), Some("42"));
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn roster_partial_failure_does_not_retry() {
        let client = Arc::new(PresenceClient::new(
            RosterTransport::default()
                .online("A", Duration::ZERO)
                .failing("B", 503)
                .online("C", Duration::ZERO),
            BASE,
        ));
        let roster = Roster::new(["A", "B", "C"]).expect("roster");
        let config =
            PollerConfig::new("friends", Duration::from_secs(30)).with_retry(RetryPolicy::default());
        let handle = start(config, super::roster(client, roster));

        sleep(Duration::from_secs(10)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.phase, PollPhase::Success);
        assert_eq!(snap.retry_count, 0);
        assert!(snap.last_error.is_none());
        let value = snap.last_value.expect("aggregate");
        assert_eq!(value.subjects.len(), 2);
        assert!(!value.subjects.contains_key("B"));
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn roster_total_failure_engages_retry() {
        let client = Arc::new(PresenceClient::new(
            RosterTransport::default().failing("A", 500).failing("B", 500),
            BASE,
        ));
        let roster = Roster::new(["A", "B", "C"]).expect("roster");
        let config =
            PollerConfig::new("friends", Duration::from_secs(30)).with_retry(RetryPolicy::default());
        let handle = start(config, super::roster(client, roster));

        sleep(Duration::from_millis(500)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.phase, PollPhase::Failed);
        assert!(snap.last_value.is_none());
        assert_eq!(snap.retry_count, 1);
        let info = snap.last_error.expect("error");
        assert_eq!(info.error, RefreshError::NoneResolved { attempted: 3 });
        assert_eq!(info.next_retry_ms, Some(1000));

        sleep(Duration::from_secs(10)).await;
        assert!(handle.snapshot().has_given_up());
        handle.stop().await;
    }
}
