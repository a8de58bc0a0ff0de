//! Presence endpoint client: `GET {base}/v1/users/{id}`.

use folio_core::roster::is_valid_subject_id;
use folio_core::{FetchError, PresenceSubject, decode_presence};
use tokio_util::sync::CancellationToken;

use crate::transport::HttpTransport;

pub struct PresenceClient<T> {
    transport: T,
    base_url: String,
}

impl<T: HttpTransport> PresenceClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    pub fn user_url(&self, subject_id: &str) -> String {
        format!("{}/v1/users/{subject_id}", self.base_url)
    }

    /// Fetch one subject's presence.
    ///
    /// If `cancel` fires before the response is decoded, the request is
    /// dropped and `FetchError::Cancelled` is returned; callers must treat
    /// that as a no-op.
    pub async fn fetch_presence(
        &self,
        subject_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PresenceSubject, FetchError> {
        if !is_valid_subject_id(subject_id) {
            return Err(FetchError::InvalidSubject(subject_id.to_string()));
        }
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let url = self.user_url(subject_id);
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FetchError::Cancelled),
            r = self.transport.get(&url) => r?,
        };

        let result = decode_presence(subject_id, response.status, &response.body);
        if let Err(ref e) = result {
            tracing::debug!(subject = subject_id, kind = e.kind(), "presence fetch failed: {e}");
        }
        result
    }
}
