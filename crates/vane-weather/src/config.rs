//! Runtime configuration for the weather pipeline.
//!
//! A `WeatherConfig` is built once at process start and injected into
//! `WeatherService::new`; it is immutable thereafter. The geocoding
//! fallback order is part of the configuration rather than a hidden
//! constant so that callers can see and adjust the strategy chain.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_GEO_BASE_URL: &str = "https://api.openweathermap.org/geo/1.0";

/// Measurement system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

impl Units {
    /// Value of the provider's `units` query parameter.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Imperial => "imperial",
            Self::Metric => "metric",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Provider API key. When absent, resolution fails with `MissingApiKey`.
    pub api_key: Option<String>,

    /// Base URL of the current-weather/forecast API.
    pub api_base_url: String,

    /// Base URL of the geocoding API.
    pub geo_base_url: String,

    /// Measurement system for temperatures and wind speed.
    pub units: Units,

    /// Country tried first for postal-code and numeric-address lookups.
    pub default_country: String,

    /// Countries tried, in order, for postal-code lookups after the default.
    pub zip_fallback_countries: Vec<String>,

    /// Country suffixes tried, in order, for free-text lookups.
    pub text_fallback_countries: Vec<String>,

    /// Timeout applied to each upstream HTTP call.
    pub request_timeout_secs: u64,

    /// Freshness window for cached weather data.
    pub cache_ttl_minutes: i64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            geo_base_url: DEFAULT_GEO_BASE_URL.to_string(),
            units: Units::default(),
            default_country: "US".to_string(),
            zip_fallback_countries: ["CA", "MX", "GB", "ES", "FR", "DE", "IT", "JP", "AU"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            text_fallback_countries: ["US", "CA", "GB", "MX", "ES", "FR", "DE", "IT", "JP", "AU"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            request_timeout_secs: 10,
            cache_ttl_minutes: 30,
        }
    }
}

impl WeatherConfig {
    /// Default configuration with the API key taken from the
    /// `OPENWEATHER_API_KEY` environment variable.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENWEATHER_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cache_ttl_minutes)
    }
}
