//! Weather provider adapter: fetches current conditions and the 3-hourly
//! forecast for a coordinate pair and normalizes both into a
//! `WeatherReport`.
//!
//! The two upstream calls are independent and run concurrently. Either may
//! fail without invalidating the other; the failed half of the report is
//! left absent. Only when both calls fail does `fetch` return an error.

use chrono::{FixedOffset, Offset, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::config::{Units, WeatherConfig};
use crate::error::WeatherError;
use crate::types::{Coordinates, DailyEntry, HourlyEntry, WeatherReport};

const ICON_URL_BASE: &str = "https://openweathermap.org/img/w";
const HOURLY_ENTRIES: usize = 8;
const DAILY_ENTRIES: usize = 5;

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    name: Option<String>,
    sys: Option<SysInfo>,
    main: Option<MainInfo>,
    #[serde(default)]
    weather: Vec<ConditionInfo>,
    wind: Option<WindInfo>,
}

#[derive(Debug, Deserialize)]
struct SysInfo {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainInfo {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: Option<u8>,
    pressure: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ConditionInfo {
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WindInfo {
    speed: Option<f64>,
    deg: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastSample>,
    city: Option<CityInfo>,
}

#[derive(Debug, Deserialize)]
struct CityInfo {
    /// UTC offset of the forecast location, in seconds.
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ForecastSample {
    dt: i64,
    main: Option<MainInfo>,
    #[serde(default)]
    weather: Vec<ConditionInfo>,
}

pub struct WeatherProvider {
    client: Client,
    api_key: String,
    base_url: String,
    units: Units,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig, api_key: &str) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.api_base_url.clone(),
            units: config.units,
        })
    }

    /// Fetch and normalize weather data for the given coordinates.
    pub async fn fetch(&self, coordinates: &Coordinates) -> Result<WeatherReport, WeatherError> {
        let (current, forecast) = tokio::join!(
            self.get_json::<CurrentResponse>("weather", coordinates),
            self.get_json::<ForecastResponse>("forecast", coordinates),
        );

        let current = match current {
            Ok(body) => Some(body),
            Err(e) if forecast.is_err() => return Err(e),
            Err(e) => {
                tracing::warn!("current conditions call failed: {}", e);
                None
            }
        };
        let forecast = match forecast {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("forecast call failed: {}", e);
                None
            }
        };

        let mut report = current.map(report_from_current).unwrap_or_default();
        if let Some(body) = forecast {
            let offset = utc_offset(body.city.and_then(|c| c.timezone).unwrap_or(0));
            report.hourly = build_hourly(&body.list, offset);
            report.daily = build_daily(&body.list, offset);
        }

        Ok(report)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        coordinates: &Coordinates,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("units", self.units.as_query_value().to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WeatherError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(format!("invalid {} response: {}", endpoint, e)))
    }
}

fn utc_offset(secs: i32) -> FixedOffset {
    FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
}

fn round_temp(value: Option<f64>) -> Option<i32> {
    value.map(|v| v.round() as i32)
}

fn report_from_current(body: CurrentResponse) -> WeatherReport {
    let main = body.main;
    let (description, icon) = body
        .weather
        .into_iter()
        .next()
        .map(|c| (c.description, c.icon))
        .unwrap_or((None, None));

    WeatherReport {
        location: body.name,
        country: body.sys.and_then(|s| s.country),
        current_temp: round_temp(main.as_ref().and_then(|m| m.temp)),
        feels_like: round_temp(main.as_ref().and_then(|m| m.feels_like)),
        high_temp: round_temp(main.as_ref().and_then(|m| m.temp_max)),
        low_temp: round_temp(main.as_ref().and_then(|m| m.temp_min)),
        humidity: main.as_ref().and_then(|m| m.humidity),
        pressure: main.as_ref().and_then(|m| m.pressure),
        icon_url: icon.as_ref().map(|i| format!("{}/{}.png", ICON_URL_BASE, i)),
        description,
        icon,
        wind_speed: body.wind.as_ref().and_then(|w| w.speed),
        wind_deg: body.wind.and_then(|w| w.deg),
        hourly: Vec::new(),
        daily: Vec::new(),
    }
}

/// First eight raw samples, each with a local-time label.
fn build_hourly(samples: &[ForecastSample], offset: FixedOffset) -> Vec<HourlyEntry> {
    samples
        .iter()
        .take(HOURLY_ENTRIES)
        .map(|sample| HourlyEntry {
            label: offset
                .timestamp_opt(sample.dt, 0)
                .single()
                .map(|dt| dt.format("%-I:00 %p").to_string())
                .unwrap_or_default(),
            temp: round_temp(sample.main.as_ref().and_then(|m| m.temp)),
            condition: sample.weather.first().and_then(|w| w.description.clone()),
            icon: sample.weather.first().and_then(|w| w.icon.clone()),
        })
        .collect()
}

fn is_precipitation(description: Option<&str>) -> bool {
    description
        .map(|d| {
            let d = d.to_lowercase();
            d.contains("rain") || d.contains("snow")
        })
        .unwrap_or(false)
}

/// Group samples by calendar day, tracking a running high/low and keeping
/// the first-seen condition unless a later sample reports precipitation
/// while the current pick does not. Truncated to the first five days.
fn build_daily(samples: &[ForecastSample], offset: FixedOffset) -> Vec<DailyEntry> {
    let mut days: Vec<(String, DailyEntry)> = Vec::new();

    for sample in samples {
        let Some(dt) = offset.timestamp_opt(sample.dt, 0).single() else {
            continue;
        };
        let key = dt.format("%m/%d").to_string();
        let main = sample.main.as_ref();
        let condition = sample.weather.first();

        if let Some((_, entry)) = days.iter_mut().find(|(k, _)| *k == key) {
            if let Some(temp) = round_temp(main.and_then(|m| m.temp)) {
                entry.high = Some(entry.high.map_or(temp, |high| high.max(temp)));
                entry.low = Some(entry.low.map_or(temp, |low| low.min(temp)));
            }
            if !is_precipitation(entry.condition.as_deref())
                && is_precipitation(condition.and_then(|c| c.description.as_deref()))
            {
                entry.condition = condition.and_then(|c| c.description.clone());
                entry.icon = condition.and_then(|c| c.icon.clone());
            }
        } else {
            days.push((
                key.clone(),
                DailyEntry {
                    weekday: dt.format("%A").to_string(),
                    date: key,
                    high: round_temp(main.and_then(|m| m.temp_max)),
                    low: round_temp(main.and_then(|m| m.temp_min)),
                    condition: condition.and_then(|c| c.description.clone()),
                    icon: condition.and_then(|c| c.icon.clone()),
                },
            ));
        }
    }

    days.into_iter()
        .take(DAILY_ENTRIES)
        .map(|(_, entry)| entry)
        .collect()
}
