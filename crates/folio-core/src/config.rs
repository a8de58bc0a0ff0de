//! TOML configuration. Every table is optional; missing keys fall back to
//! the values the site ships with.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backoff::RetryPolicy;
use crate::roster::{DEFAULT_FRIEND_IDS, DEFAULT_PROFILE_ID, Roster, is_valid_subject_id};
use crate::weather::WeatherQuery;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolioConfig {
    pub presence: PresenceConfig,
    pub weather: WeatherConfig,
    pub intervals: IntervalConfig,
    pub retry: RetryPolicy,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresenceConfig {
    pub base_url: String,
    pub profile_id: String,
    pub friends: Vec<String>,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.lanyard.rest".to_string(),
            profile_id: DEFAULT_PROFILE_ID.to_string(),
            friends: DEFAULT_FRIEND_IDS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    pub base_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            latitude: 38.4189,
            longitude: 27.1287,
            location_name: "İzmir".to_string(),
        }
    }
}

impl WeatherConfig {
    pub fn query(&self) -> WeatherQuery {
        WeatherQuery {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntervalConfig {
    pub profile_ms: u64,
    pub friends_ms: u64,
    pub weather_ms: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            profile_ms: 5_000,
            friends_ms: 30_000,
            weather_ms: 600_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl FolioConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.presence.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("presence.base_url is empty".into()));
        }
        if self.weather.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("weather.base_url is empty".into()));
        }
        if !is_valid_subject_id(&self.presence.profile_id) {
            return Err(ConfigError::Invalid(format!(
                "presence.profile_id {:?} is not a valid subject id",
                self.presence.profile_id
            )));
        }
        if self.presence.friends.is_empty() {
            return Err(ConfigError::Invalid("presence.friends is empty".into()));
        }
        self.roster()?;

        let intervals = [
            ("intervals.profile_ms", self.intervals.profile_ms),
            ("intervals.friends_ms", self.intervals.friends_ms),
            ("intervals.weather_ms", self.intervals.weather_ms),
            ("http.timeout_ms", self.http.timeout_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
        }

        if !(-90.0..=90.0).contains(&self.weather.latitude) {
            return Err(ConfigError::Invalid(format!(
                "weather.latitude {} out of range",
                self.weather.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.weather.longitude) {
            return Err(ConfigError::Invalid(format!(
                "weather.longitude {} out of range",
                self.weather.longitude
            )));
        }
        Ok(())
    }

    pub fn roster(&self) -> Result<Roster, ConfigError> {
        Roster::new(self.presence.friends.iter().cloned())
    }
}
