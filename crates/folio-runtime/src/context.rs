//! Clients built from the effective configuration, shared by every command.

use std::sync::Arc;

use anyhow::Context;
use folio_client::{HttpTransport, PresenceClient, ReqwestTransport, WeatherClient};
use folio_core::FolioConfig;

pub struct Clients<T> {
    pub presence: Arc<PresenceClient<Arc<T>>>,
    pub weather: Arc<WeatherClient<Arc<T>>>,
}

impl<T: HttpTransport> Clients<T> {
    /// Both clients share one transport (one connection pool).
    pub fn new(transport: T, config: &FolioConfig) -> Self {
        let transport = Arc::new(transport);
        Self {
            presence: Arc::new(PresenceClient::new(
                Arc::clone(&transport),
                config.presence.base_url.as_str(),
            )),
            weather: Arc::new(WeatherClient::new(
                transport,
                config.weather.base_url.as_str(),
            )),
        }
    }
}

pub fn build_clients(config: &FolioConfig) -> anyhow::Result<Clients<ReqwestTransport>> {
    let transport =
        ReqwestTransport::new(config.http.timeout()).context("building HTTP client")?;
    Ok(Clients::new(transport, config))
}

/// Current wall-clock time in epoch milliseconds, for now-playing progress.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
