use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cache partition key: address lowercased and trimmed, so inputs that
/// differ only by case or surrounding whitespace collapse to one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedAddress(String);

impl NormalizedAddress {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the address consists solely of digits (postal-code shape).
    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|c| c.is_ascii_digit())
    }
}

impl std::fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Geographic coordinates produced by the resolver. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Resolved place name as reported by the geocoder.
    pub name: String,
}

impl Coordinates {
    /// Location half of the cache key, rendered exactly as stored.
    pub fn cache_key(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// One 3-hourly forecast sample, rendered for display.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HourlyEntry {
    /// Local-time label such as "2:00 PM".
    pub label: String,
    pub temp: Option<i32>,
    pub condition: Option<String>,
    pub icon: Option<String>,
}

/// One aggregated calendar day of forecast data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyEntry {
    /// Weekday name, e.g. "Tuesday".
    pub weekday: String,
    /// Short date label, e.g. "11/14".
    pub date: String,
    pub high: Option<i32>,
    pub low: Option<i32>,
    pub condition: Option<String>,
    pub icon: Option<String>,
}

/// Canonical normalized weather payload. Every provider-derived field is
/// optional; a missing upstream value stays absent rather than being
/// replaced with a placeholder.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: Option<String>,
    pub country: Option<String>,
    pub current_temp: Option<i32>,
    pub feels_like: Option<i32>,
    pub high_temp: Option<i32>,
    pub low_temp: Option<i32>,
    pub humidity: Option<u8>,
    pub pressure: Option<u32>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub icon_url: Option<String>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<u16>,
    #[serde(default)]
    pub hourly: Vec<HourlyEntry>,
    #[serde(default)]
    pub daily: Vec<DailyEntry>,
}

/// Terminal state of one resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// A fresh cache entry satisfied the request.
    CacheHit {
        report: WeatherReport,
        cached_at: DateTime<Utc>,
    },
    /// Data was fetched from the provider and written through to the cache.
    Fresh { report: WeatherReport },
    /// The provider confirmed the location does not exist.
    NotFound { address: String },
    /// Every geocoding strategy missed without a definitive negative.
    Unresolved,
}

impl ResolutionOutcome {
    /// The weather payload, when this outcome carries one.
    pub fn report(&self) -> Option<&WeatherReport> {
        match self {
            Self::CacheHit { report, .. } | Self::Fresh { report } => Some(report),
            Self::NotFound { .. } | Self::Unresolved => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Self::CacheHit { .. })
    }
}
