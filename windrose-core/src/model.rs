use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::WindroseError;

/// Timestamp layout used by the OpenWeatherMap forecast list (`dt_txt`) and
/// by the cache file.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Location the forecast is fetched for. Exactly one representation is
/// active per run; a named city takes priority over coordinates when both
/// are configured.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    City(String),
    Coords { lat: f64, lon: f64 },
}

impl Location {
    /// Case-normalized, filesystem-safe key for the cache file name.
    pub fn cache_key(&self) -> String {
        match self {
            Location::City(city) => sanitize(&city.to_lowercase()),
            Location::Coords { lat, lon } => format!("{lat:.4}_{lon:.4}"),
        }
    }

    /// Human-readable label used in chart titles and file names.
    pub fn label(&self) -> String {
        match self {
            Location::City(city) => city.clone(),
            Location::Coords { lat, lon } => format!("Lat {lat:.4}, Lon {lon:.4}"),
        }
    }
}

/// Replaces characters that are unsafe in file names.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// One time-stamped wind sample.
///
/// `direction` follows the meteorological convention: degrees in [0, 360),
/// measuring where the wind blows *from* (0 = north, 90 = east).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    #[serde(with = "datetime_text")]
    pub datetime: NaiveDateTime,
    /// Wind speed in m/s, non-negative.
    pub speed: f64,
    pub direction: f64,
}

/// Ordered sequence of forecast records; insertion order is the
/// chronological order returned by the upstream API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastTable {
    records: Vec<ForecastRecord>,
}

impl ForecastTable {
    pub fn new(records: Vec<ForecastRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ForecastRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest timestamp over the table. The records are not
    /// required to be sorted.
    pub fn time_span(&self) -> Result<(NaiveDateTime, NaiveDateTime), WindroseError> {
        let timestamps = self.records.iter().map(|r| r.datetime);
        let start = timestamps.clone().min().ok_or(WindroseError::EmptyData)?;
        let end = timestamps.max().ok_or(WindroseError::EmptyData)?;
        Ok((start, end))
    }
}

impl FromIterator<ForecastRecord> for ForecastTable {
    fn from_iter<T: IntoIterator<Item = ForecastRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Serde adapter storing timestamps in the upstream `dt_txt` text form,
/// e.g. `2026-08-29 12:00:00`.
mod datetime_text {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    use super::DATETIME_FORMAT;

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(DATETIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(datetime: &str, speed: f64, direction: f64) -> ForecastRecord {
        ForecastRecord {
            datetime: NaiveDateTime::parse_from_str(datetime, DATETIME_FORMAT)
                .expect("valid test timestamp"),
            speed,
            direction,
        }
    }

    #[test]
    fn time_span_orders_start_before_end() {
        // Records deliberately out of order.
        let table = ForecastTable::new(vec![
            record("2026-08-30 09:00:00", 2.0, 90.0),
            record("2026-08-29 12:00:00", 1.0, 0.0),
            record("2026-08-31 18:00:00", 3.0, 180.0),
        ]);

        let (start, end) = table.time_span().expect("non-empty table has a span");
        assert!(start <= end);
        assert_eq!(
            start,
            NaiveDate::from_ymd_opt(2026, 8, 29)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );
        assert_eq!(
            end,
            NaiveDate::from_ymd_opt(2026, 8, 31)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn time_span_fails_on_empty_table() {
        let table = ForecastTable::default();
        let err = table.time_span().unwrap_err();
        assert!(matches!(err, WindroseError::EmptyData));
    }

    #[test]
    fn city_cache_key_is_case_normalized() {
        let location = Location::City("München".to_string());
        assert_eq!(location.cache_key(), "münchen");

        let spaced = Location::City("New York".to_string());
        assert_eq!(spaced.cache_key(), "new_york");
    }

    #[test]
    fn coords_cache_key_and_label() {
        let location = Location::Coords {
            lat: 52.4,
            lon: 13.0667,
        };
        assert_eq!(location.cache_key(), "52.4000_13.0667");
        assert_eq!(location.label(), "Lat 52.4000, Lon 13.0667");
    }

    #[test]
    fn sanitize_keeps_word_characters() {
        assert_eq!(sanitize("Lat 52.40, Lon 13.07"), "Lat_52.40__Lon_13.07");
        assert_eq!(sanitize("münchen"), "münchen");
    }
}
