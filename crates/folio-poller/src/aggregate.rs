//! Multi-subject fan-out over the presence client.

use folio_client::{HttpTransport, PresenceClient};
use folio_core::AggregateResult;
use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;

/// Fetch every subject concurrently under one shared cancel token and wait
/// for all of them to settle. A failed subject never short-circuits the
/// batch; it only shows up in [`AggregateResult::failures`].
pub async fn refresh_all<T: HttpTransport>(
    client: &PresenceClient<T>,
    subject_ids: &[String],
    cancel: &CancellationToken,
) -> AggregateResult {
    let fetches = subject_ids.iter().map(|id| async move {
        let outcome = client.fetch_presence(id, cancel).await;
        (id.clone(), outcome)
    });
    let result = AggregateResult::from_outcomes(join_all(fetches).await);

    tracing::debug!(
        resolved = result.subjects.len(),
        failed = result.failures.len(),
        "aggregate refresh settled"
    );
    for failure in &result.failures {
        if !failure.error.is_cancelled() {
            tracing::debug!(subject = %failure.id, kind = failure.error.kind(), "subject unresolved: {}", failure.error);
        }
    }
    result
}
