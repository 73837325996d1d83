use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::WindroseError;
use crate::model::{DATETIME_FORMAT, ForecastRecord, ForecastTable, Location};

use super::ForecastProvider;

/// OpenWeatherMap 5-day / 3-hour forecast endpoint.
const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self, WindroseError> {
        Self::with_base_url(api_key, FORECAST_URL.to_string())
    }

    /// Points the provider at a different forecast endpoint. Used by tests
    /// to target a local mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, WindroseError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(WindroseError::HttpClient)?;

        Ok(Self {
            api_key,
            base_url,
            http,
        })
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn fetch_forecast(&self, location: &Location) -> Result<ForecastTable, WindroseError> {
        let mut query: Vec<(&str, String)> = match location {
            Location::City(city) => vec![("q", city.clone())],
            Location::Coords { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        };
        query.push(("appid", self.api_key.clone()));
        query.push(("units", "metric".to_string()));

        let res = self
            .http
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| WindroseError::Transport(self.base_url.clone(), e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WindroseError::Transport(self.base_url.clone(), e))?;

        if !status.is_success() {
            return Err(WindroseError::HttpStatus {
                url: self.base_url.clone(),
                status,
                body: truncate_body(&body),
            });
        }

        parse_forecast(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Parses the OpenWeatherMap forecast JSON body into a [`ForecastTable`],
/// preserving upstream order. A response with zero forecast entries yields
/// an empty table, not an error.
pub fn parse_forecast(body: &str) -> Result<ForecastTable, WindroseError> {
    let parsed: OwForecastResponse = serde_json::from_str(body)
        .map_err(|e| WindroseError::format("OpenWeatherMap forecast JSON", e))?;

    let mut records = Vec::with_capacity(parsed.list.len());
    for entry in parsed.list {
        let datetime = NaiveDateTime::parse_from_str(&entry.dt_txt, DATETIME_FORMAT)
            .map_err(|e| WindroseError::format(format!("forecast timestamp '{}'", entry.dt_txt), e))?;
        records.push(ForecastRecord {
            datetime,
            speed: entry.wind.speed,
            direction: entry.wind.deg,
        });
    }
    Ok(ForecastTable::new(records))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    // Cut on a char boundary; slicing at a fixed byte index would panic on
    // multi-byte characters.
    let cut = (0..=MAX)
        .rev()
        .find(|&i| body.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}...", &body[..cut])
}
