use async_trait::async_trait;
use std::fmt::Debug;
use tracing::info;

use crate::cache::ForecastCache;
use crate::config::Config;
use crate::error::WindroseError;
use crate::model::{ForecastTable, Location};
use crate::provider::openweather::OpenWeatherProvider;

pub mod openweather;

/// Upstream forecast source. The seam exists so tests can substitute a mock
/// endpoint without touching the cache logic.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_forecast(&self, location: &Location) -> Result<ForecastTable, WindroseError>;
}

/// Fetches forecast records for the configured location, reusing the
/// on-disk cache while it is fresh.
pub async fn fetch_weather_data(config: &Config) -> Result<ForecastTable, WindroseError> {
    let provider = OpenWeatherProvider::new(config.api_key.clone())?;
    let cache = ForecastCache::new(&config.cache_dir, config.cache_max_age);
    fetch_with_provider(&provider, &cache, &config.location).await
}

/// Cache-first fetch against an explicit provider.
///
/// A fresh cache entry short-circuits the network call entirely. Otherwise
/// one fetch is attempted (no retry) and the result is persisted before it
/// is returned, overwriting any stale entry.
pub async fn fetch_with_provider(
    provider: &dyn ForecastProvider,
    cache: &ForecastCache,
    location: &Location,
) -> Result<ForecastTable, WindroseError> {
    if let Some(table) = cache.load_fresh(location)? {
        info!("Loading forecast data from cache");
        return Ok(table);
    }

    info!("Fetching forecast data from OpenWeatherMap");
    let table = provider.fetch_forecast(location).await?;
    cache.store(location, &table)?;
    Ok(table)
}
