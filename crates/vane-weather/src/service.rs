//! Cache-aside orchestration: resolve an address into weather data.
//!
//! The service checks the cache by address alone, geocodes on a miss,
//! checks the cache again under the resolved coordinates, and only then
//! fetches from the provider, writing the result through to the cache.
//! Each upstream call is attempted exactly once per resolution pass; there
//! are no retries and stale entries are never served.

use tracing::{info, instrument, warn};

use crate::cache::{CacheEntry, WeatherCache};
use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::geocode::{Geocoder, Resolution};
use crate::provider::WeatherProvider;
use crate::types::{NormalizedAddress, ResolutionOutcome};

pub struct WeatherService {
    geocoder: Option<Geocoder>,
    provider: Option<WeatherProvider>,
    cache: WeatherCache,
}

impl WeatherService {
    /// Build the service from an immutable configuration loaded at process
    /// start. A missing API key is not an error here; it surfaces as
    /// `MissingApiKey` on each resolution attempt.
    pub fn new(config: &WeatherConfig, cache: WeatherCache) -> Result<Self, WeatherError> {
        let (geocoder, provider) = match config.api_key.as_deref().filter(|key| !key.is_empty()) {
            Some(key) => (
                Some(Geocoder::new(config, key)?),
                Some(WeatherProvider::new(config, key)?),
            ),
            None => (None, None),
        };
        Ok(Self {
            geocoder,
            provider,
            cache,
        })
    }

    /// Resolve a raw address string into a weather outcome.
    #[instrument(skip(self), level = "info")]
    pub async fn resolve(&self, address: &str) -> Result<ResolutionOutcome, WeatherError> {
        let normalized = NormalizedAddress::new(address);
        if normalized.is_empty() {
            return Err(WeatherError::InvalidAddress);
        }

        let (Some(geocoder), Some(provider)) = (self.geocoder.as_ref(), self.provider.as_ref())
        else {
            warn!("weather API key is not configured");
            return Err(WeatherError::MissingApiKey);
        };

        // Coordinate-independent probe: any fresh entry for this address.
        if let Some(entry) = self.cache_get(&normalized, None) {
            info!(address = %normalized, "returning cached weather data");
            return Ok(ResolutionOutcome::CacheHit {
                report: entry.report,
                cached_at: entry.created_at,
            });
        }

        let coordinates = match geocoder.resolve(&normalized).await {
            Resolution::Found(coordinates) => coordinates,
            Resolution::NotFound => {
                info!(address = %normalized, "location confirmed not to exist");
                return Ok(ResolutionOutcome::NotFound {
                    address: normalized.to_string(),
                });
            }
            Resolution::Inconclusive => {
                warn!(address = %normalized, "failed to geocode address");
                return Ok(ResolutionOutcome::Unresolved);
            }
        };

        // Second probe under the concrete coordinates. The same name can
        // resolve differently than it did for an earlier entry, so this key
        // is checked separately from the address-only probe.
        let location_key = coordinates.cache_key();
        if let Some(entry) = self.cache_get(&normalized, Some(&location_key)) {
            info!(address = %normalized, location = %location_key, "returning cached weather data");
            return Ok(ResolutionOutcome::CacheHit {
                report: entry.report,
                cached_at: entry.created_at,
            });
        }

        let report = provider.fetch(&coordinates).await?;
        if let Err(e) = self.cache.put(&normalized, &location_key, &report) {
            warn!("failed to cache weather data: {}", e);
        }
        info!(address = %normalized, location = %location_key, "fetched fresh weather data");
        Ok(ResolutionOutcome::Fresh { report })
    }

    /// Cache reads degrade to a miss on failure; a broken cache must never
    /// fail the request.
    fn cache_get(&self, address: &NormalizedAddress, location: Option<&str>) -> Option<CacheEntry> {
        match self.cache.get_fresh(address, location) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("weather cache read failed: {}", e);
                None
            }
        }
    }
}
