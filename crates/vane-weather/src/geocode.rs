//! Forward geocoding: resolve a free-form address or postal code into
//! coordinates through an ordered chain of lookup strategies.
//!
//! All-digit input is treated as a postal code and tried against the
//! provider's postal endpoint for the default country, then each configured
//! fallback country. Free-text lookup follows, first with the raw address
//! and then suffixed with each configured country code. The first success
//! wins; candidates are never ranked or merged.

use reqwest::Client;
use serde::Deserialize;

use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::types::{Coordinates, NormalizedAddress};

/// Outcome of a full pass over the strategy chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Coordinates),
    /// The provider definitively confirmed the location does not exist.
    NotFound,
    /// Every strategy missed without a definitive negative; the provider
    /// may have been unreachable or returned ambiguous data.
    Inconclusive,
}

/// Outcome of a single postal-code lookup.
enum ZipLookup {
    Found(Coordinates),
    /// Provider answered 404: the code does not exist in that country.
    NotFound,
    /// Network failure, non-2xx other than 404, or an unusable body.
    Unavailable,
}

#[derive(Debug, Deserialize)]
struct ZipResponse {
    lat: Option<f64>,
    lon: Option<f64>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoCandidate {
    lat: f64,
    lon: f64,
    #[serde(default)]
    name: String,
}

pub struct Geocoder {
    client: Client,
    api_key: String,
    base_url: String,
    default_country: String,
    zip_countries: Vec<String>,
    text_countries: Vec<String>,
}

impl Geocoder {
    pub fn new(config: &WeatherConfig, api_key: &str) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.geo_base_url.clone(),
            default_country: config.default_country.clone(),
            zip_countries: config.zip_fallback_countries.clone(),
            text_countries: config.text_fallback_countries.clone(),
        })
    }

    /// Run the strategy chain for one address. Strategy-level network
    /// failures never abort the chain; they only count as a miss for that
    /// strategy.
    pub async fn resolve(&self, address: &NormalizedAddress) -> Resolution {
        if address.is_numeric() {
            tracing::debug!(address = %address, "treating all-digit address as a postal code");

            let mut attempts = 0usize;
            let mut definitive_misses = 0usize;
            for country in std::iter::once(self.default_country.as_str())
                .chain(self.zip_countries.iter().map(String::as_str))
            {
                attempts += 1;
                match self.zip_lookup(address.as_str(), country).await {
                    ZipLookup::Found(coords) => return Resolution::Found(coords),
                    ZipLookup::NotFound => definitive_misses += 1,
                    ZipLookup::Unavailable => {}
                }
            }

            // A confident negative requires every postal attempt to have
            // come back as a provider-confirmed 404. A single transient
            // miss downgrades this to continuing the chain.
            if attempts > 0 && definitive_misses == attempts {
                tracing::info!(
                    address = %address,
                    "postal code does not exist in any configured country"
                );
                return Resolution::NotFound;
            }
        }

        if let Some(coords) = self.text_lookup(address.as_str()).await {
            return Resolution::Found(coords);
        }

        if address.is_numeric() {
            let query = format!("{},{}", address.as_str(), self.default_country);
            if let Some(coords) = self.text_lookup(&query).await {
                return Resolution::Found(coords);
            }
        }

        for country in &self.text_countries {
            let query = format!("{},{}", address.as_str(), country);
            if let Some(coords) = self.text_lookup(&query).await {
                return Resolution::Found(coords);
            }
        }

        tracing::debug!(address = %address, "geocoding exhausted all strategies");
        Resolution::Inconclusive
    }

    async fn zip_lookup(&self, zip: &str, country: &str) -> ZipLookup {
        let url = format!("{}/zip", self.base_url);
        let zip_param = format!("{},{}", zip, country);

        let response = match self
            .client
            .get(&url)
            .query(&[("zip", zip_param.as_str()), ("appid", self.api_key.as_str())])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("postal lookup for {} failed: {}", zip_param, e);
                return ZipLookup::Unavailable;
            }
        };

        let status = response.status();
        if status.as_u16() == 404 {
            return ZipLookup::NotFound;
        }
        if !status.is_success() {
            tracing::debug!("postal lookup for {} returned {}", zip_param, status);
            return ZipLookup::Unavailable;
        }

        match response.json::<ZipResponse>().await {
            Ok(body) => match (body.lat, body.lon) {
                (Some(lat), Some(lon)) => ZipLookup::Found(Coordinates {
                    latitude: lat,
                    longitude: lon,
                    name: body.name.unwrap_or_else(|| zip_param.clone()),
                }),
                _ => {
                    tracing::debug!("postal lookup for {} returned no coordinates", zip_param);
                    ZipLookup::Unavailable
                }
            },
            Err(e) => {
                tracing::debug!("postal lookup parse error for {}: {}", zip_param, e);
                ZipLookup::Unavailable
            }
        }
    }

    /// Free-text lookup taking the first candidate, if any. `None` covers
    /// both "no candidates" and transient failure.
    async fn text_lookup(&self, query: &str) -> Option<Coordinates> {
        let url = format!("{}/direct", self.base_url);

        let response = match self
            .client
            .get(&url)
            .query(&[("q", query), ("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("geocoding request for {:?} failed: {}", query, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("geocoding for {:?} returned {}", query, response.status());
            return None;
        }

        let candidates: Vec<GeoCandidate> = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("geocoding parse error for {:?}: {}", query, e);
                return None;
            }
        };

        let first = candidates.into_iter().next()?;
        Some(Coordinates {
            latitude: first.lat,
            longitude: first.lon,
            name: first.name,
        })
    }
}
