//! SQLite-backed weather cache with a fixed freshness window.
//!
//! Reads only ever surface fresh rows; the freshness filter lives inside the
//! store, never in callers. Writes always stamp the current time and replace
//! any prior row for the same key.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::WeatherError;
use crate::types::{NormalizedAddress, WeatherReport};

/// A fresh cache row, deserialized.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub report: WeatherReport,
    pub created_at: DateTime<Utc>,
}

pub struct WeatherCache {
    conn: Mutex<Connection>,
    ttl: Duration,
}

impl WeatherCache {
    /// Open (or create) a cache at the given path.
    pub fn new<P: AsRef<Path>>(path: P, ttl: Duration) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self {
            conn: Mutex::new(conn),
            ttl,
        };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (for testing).
    #[cfg(test)]
    pub fn in_memory(ttl: Duration) -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self {
            conn: Mutex::new(conn),
            ttl,
        };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weather_cache (
                address TEXT NOT NULL,
                location TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (address, location)
            );

            CREATE INDEX IF NOT EXISTS idx_weather_cache_address ON weather_cache(address);
            CREATE INDEX IF NOT EXISTS idx_weather_cache_created_at ON weather_cache(created_at);
            "#,
        )?;
        Ok(())
    }

    /// Look up a fresh entry. With `location = None` this is the
    /// coordinate-independent probe: the most recent fresh row for the
    /// address, whatever it resolved to. Expired rows are never returned.
    pub fn get_fresh(
        &self,
        address: &NormalizedAddress,
        location: Option<&str>,
    ) -> Result<Option<CacheEntry>, WeatherError> {
        let cutoff = (Utc::now() - self.ttl).timestamp_millis();
        let conn = self.conn.lock();

        let row: Option<(String, i64)> = match location {
            Some(location) => conn
                .query_row(
                    "SELECT data, created_at FROM weather_cache
                     WHERE address = ?1 AND location = ?2 AND created_at > ?3",
                    params![address.as_str(), location, cutoff],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?,
            None => conn
                .query_row(
                    "SELECT data, created_at FROM weather_cache
                     WHERE address = ?1 AND created_at > ?2
                     ORDER BY created_at DESC LIMIT 1",
                    params![address.as_str(), cutoff],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?,
        };

        let Some((data, created_ms)) = row else {
            return Ok(None);
        };
        let report = serde_json::from_str(&data)
            .map_err(|e| WeatherError::Cache(format!("corrupt cache row: {}", e)))?;
        Ok(Some(CacheEntry {
            report,
            created_at: DateTime::from_timestamp_millis(created_ms).unwrap_or_default(),
        }))
    }

    /// Write an entry stamped with the current time, replacing any prior
    /// row for the same key.
    pub fn put(
        &self,
        address: &NormalizedAddress,
        location: &str,
        report: &WeatherReport,
    ) -> Result<(), WeatherError> {
        self.put_at(address, location, report, Utc::now())
    }

    fn put_at(
        &self,
        address: &NormalizedAddress,
        location: &str,
        report: &WeatherReport,
        created_at: DateTime<Utc>,
    ) -> Result<(), WeatherError> {
        let data = serde_json::to_string(report)
            .map_err(|e| WeatherError::Cache(format!("failed to serialize report: {}", e)))?;
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO weather_cache (address, location, data, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                address.as_str(),
                location,
                data,
                created_at.timestamp_millis()
            ],
        )?;
        Ok(())
    }

    /// Delete rows past the freshness window. Expired rows are never read;
    /// this only keeps the table from growing without bound.
    pub fn clear_expired(&self) -> Result<usize, WeatherError> {
        let cutoff = (Utc::now() - self.ttl).timestamp_millis();
        let removed = self.conn.lock().execute(
            "DELETE FROM weather_cache WHERE created_at <= ?1",
            params![cutoff],
        )?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn test_report(temp: i32) -> WeatherReport {
        WeatherReport {
            location: Some("New York".to_string()),
            current_temp: Some(temp),
            ..WeatherReport::default()
        }
    }

    fn test_cache() -> WeatherCache {
        WeatherCache::in_memory(Duration::minutes(30)).unwrap()
    }

    #[test]
    fn test_put_and_get_fresh() {
        let cache = test_cache();
        let address = NormalizedAddress::new("10001");

        cache.put(&address, "40.75,-73.99", &test_report(72)).unwrap();

        let entry = cache
            .get_fresh(&address, Some("40.75,-73.99"))
            .unwrap()
            .unwrap();
        assert_eq!(entry.report.current_temp, Some(72));
    }

    #[test]
    fn test_address_only_probe_ignores_location() {
        let cache = test_cache();
        let address = NormalizedAddress::new("new york, ny");

        cache.put(&address, "40.71,-74.01", &test_report(70)).unwrap();

        let entry = cache.get_fresh(&address, None).unwrap().unwrap();
        assert_eq!(entry.report.current_temp, Some(70));
    }

    #[test]
    fn test_miss_for_unknown_address() {
        let cache = test_cache();
        let entry = cache
            .get_fresh(&NormalizedAddress::new("nowhere"), None)
            .unwrap();
        assert!(entry.is_none());
    }

    #[test]
    fn test_entry_at_29_minutes_is_fresh_at_31_it_is_not() {
        let cache = test_cache();
        let address = NormalizedAddress::new("10001");
        let location = "40.75,-73.99";

        cache
            .put_at(
                &address,
                location,
                &test_report(72),
                Utc::now() - Duration::minutes(29),
            )
            .unwrap();
        assert!(cache.get_fresh(&address, Some(location)).unwrap().is_some());

        cache
            .put_at(
                &address,
                location,
                &test_report(72),
                Utc::now() - Duration::minutes(31),
            )
            .unwrap();
        assert!(cache.get_fresh(&address, Some(location)).unwrap().is_none());
        assert!(cache.get_fresh(&address, None).unwrap().is_none());
    }

    #[test]
    fn test_put_overwrites_expired_entry() {
        let cache = test_cache();
        let address = NormalizedAddress::new("10001");
        let location = "40.75,-73.99";

        cache
            .put_at(
                &address,
                location,
                &test_report(60),
                Utc::now() - Duration::minutes(45),
            )
            .unwrap();
        assert!(cache.get_fresh(&address, Some(location)).unwrap().is_none());

        cache.put(&address, location, &test_report(72)).unwrap();
        let entry = cache.get_fresh(&address, Some(location)).unwrap().unwrap();
        assert_eq!(entry.report.current_temp, Some(72));
    }

    #[test]
    fn test_same_address_different_coordinates_are_distinct_keys() {
        let cache = test_cache();
        let address = NormalizedAddress::new("springfield");

        cache.put(&address, "39.8,-89.6", &test_report(65)).unwrap();
        cache.put(&address, "42.1,-72.6", &test_report(58)).unwrap();

        let il = cache.get_fresh(&address, Some("39.8,-89.6")).unwrap().unwrap();
        let ma = cache.get_fresh(&address, Some("42.1,-72.6")).unwrap().unwrap();
        assert_eq!(il.report.current_temp, Some(65));
        assert_eq!(ma.report.current_temp, Some(58));
    }

    #[test]
    fn test_address_only_probe_prefers_most_recent() {
        let cache = test_cache();
        let address = NormalizedAddress::new("springfield");

        cache
            .put_at(
                &address,
                "39.8,-89.6",
                &test_report(65),
                Utc::now() - Duration::minutes(10),
            )
            .unwrap();
        cache.put(&address, "42.1,-72.6", &test_report(58)).unwrap();

        let entry = cache.get_fresh(&address, None).unwrap().unwrap();
        assert_eq!(entry.report.current_temp, Some(58));
    }

    #[test]
    fn test_clear_expired_only_removes_stale_rows() {
        let cache = test_cache();
        let address = NormalizedAddress::new("10001");

        cache
            .put_at(
                &address,
                "40.75,-73.99",
                &test_report(60),
                Utc::now() - Duration::minutes(45),
            )
            .unwrap();
        cache
            .put(&NormalizedAddress::new("90210"), "34.1,-118.4", &test_report(80))
            .unwrap();

        let removed = cache.clear_expired().unwrap();
        assert_eq!(removed, 1);
        assert!(cache
            .get_fresh(&NormalizedAddress::new("90210"), None)
            .unwrap()
            .is_some());
    }
}
