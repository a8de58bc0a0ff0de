//! Local weather: forecast model, request query and condition buckets.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Forecast {
    pub current: CurrentWeather,
    pub daily: DailyWeather,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CurrentWeather {
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub wind_speed_10m: f64,
    pub weather_code: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DailyWeather {
    #[serde(default)]
    pub temperature_2m_max: Vec<f64>,
    #[serde(default)]
    pub temperature_2m_min: Vec<f64>,
}

impl Forecast {
    /// Today's `(min, max)`, when the daily block has an entry.
    pub fn today_range(&self) -> Option<(f64, f64)> {
        let min = *self.daily.temperature_2m_min.first()?;
        let max = *self.daily.temperature_2m_max.first()?;
        Some((min, max))
    }

    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_code(self.current.weather_code)
    }
}

/// Coarse WMO weather-code buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Overcast,
    Drizzle,
    Snow,
    Showers,
    Thunderstorm,
    Other,
}

impl WeatherCondition {
    pub fn from_code(code: u16) -> Self {
        match code {
            0 | 1 => WeatherCondition::Clear,
            2 => WeatherCondition::PartlyCloudy,
            3 => WeatherCondition::Overcast,
            51..=67 => WeatherCondition::Drizzle,
            71..=77 => WeatherCondition::Snow,
            80..=82 => WeatherCondition::Showers,
            95..=99 => WeatherCondition::Thunderstorm,
            _ => WeatherCondition::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::PartlyCloudy => "partly cloudy",
            WeatherCondition::Overcast => "overcast",
            WeatherCondition::Drizzle => "drizzle",
            WeatherCondition::Snow => "snow",
            WeatherCondition::Showers => "showers",
            WeatherCondition::Thunderstorm => "thunderstorm",
            WeatherCondition::Other => "windy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WeatherQuery {
    pub latitude: f64,
    pub longitude: f64,
}

impl WeatherQuery {
    /// Query string for the forecast endpoint, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        format!(
            "latitude={}&longitude={}&current={CURRENT_FIELDS}&daily={DAILY_FIELDS}&timezone=auto",
            self.latitude, self.longitude
        )
    }
}

/// Decode one forecast response.
pub fn decode_forecast(status: u16, body: &[u8]) -> Result<Forecast, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::HttpStatus(status));
    }
    serde_json::from_slice(body).map_err(|e| FetchError::Malformed(e.to_string()))
}
