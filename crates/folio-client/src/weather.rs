//! Forecast endpoint client: `GET {base}/v1/forecast?...`.

use folio_core::{FetchError, Forecast, WeatherQuery, decode_forecast};
use tokio_util::sync::CancellationToken;

use crate::transport::HttpTransport;

pub struct WeatherClient<T> {
    transport: T,
    base_url: String,
}

impl<T: HttpTransport> WeatherClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    pub fn forecast_url(&self, query: &WeatherQuery) -> String {
        format!("{}/v1/forecast?{}", self.base_url, query.to_query_string())
    }

    pub async fn fetch_forecast(
        &self,
        query: &WeatherQuery,
        cancel: &CancellationToken,
    ) -> Result<Forecast, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let url = self.forecast_url(query);
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FetchError::Cancelled),
            r = self.transport.get(&url) => r?,
        };
        decode_forecast(response.status, &response.body)
    }
}
