//! Weather resolution pipeline for Vane.
//!
//! Resolves a free-form location string (city name, "City, Country", or
//! postal code) into coordinates, fetches current conditions and a
//! multi-day forecast from OpenWeatherMap, and caches results for a
//! bounded freshness window.

pub mod cache;
pub mod config;
pub mod error;
pub mod geocode;
pub mod provider;
pub mod service;
pub mod types;

pub use cache::{CacheEntry, WeatherCache};
pub use config::{Units, WeatherConfig};
pub use error::WeatherError;
pub use geocode::{Geocoder, Resolution};
pub use provider::WeatherProvider;
pub use service::WeatherService;
pub use types::{
    Coordinates, DailyEntry, HourlyEntry, NormalizedAddress, ResolutionOutcome, WeatherReport,
};
