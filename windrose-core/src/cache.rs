//! On-disk forecast cache: one CSV file per location with header
//! `datetime,speed,direction`, freshness derived from the file modification
//! time.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::error::WindroseError;
use crate::model::{ForecastRecord, ForecastTable, Location};

pub struct ForecastCache {
    dir: PathBuf,
    max_age: Duration,
}

impl ForecastCache {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    /// Cache file path for a location, derived deterministically from its
    /// case-normalized key.
    pub fn path_for(&self, location: &Location) -> PathBuf {
        self.dir
            .join(format!("weather_cache_{}.csv", location.cache_key()))
    }

    /// Returns the cached table when the cache file exists and is younger
    /// than the freshness threshold.
    ///
    /// This is a pure read: a fresh but corrupted cache file is reported as
    /// a parse failure, not silently re-fetched.
    pub fn load_fresh(&self, location: &Location) -> Result<Option<ForecastTable>, WindroseError> {
        let path = self.path_for(location);
        if !path.exists() {
            return Ok(None);
        }

        let age = Self::age_of(&path)?;
        if age >= self.max_age {
            debug!(
                path = %path.display(),
                age_secs = age.as_secs(),
                "cache entry is stale"
            );
            return Ok(None);
        }

        read_table(&path).map(Some)
    }

    /// Persists the table, overwriting any prior content, and returns the
    /// cache file path. Creates the cache directory if absent.
    pub fn store(
        &self,
        location: &Location,
        table: &ForecastTable,
    ) -> Result<PathBuf, WindroseError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| WindroseError::CacheDirCreation(self.dir.clone(), e))?;

        let path = self.path_for(location);
        write_table(&path, table)?;
        Ok(path)
    }

    /// Wall-clock age of a cache file, from its last-modified timestamp.
    fn age_of(path: &Path) -> Result<Duration, WindroseError> {
        let metadata = fs::metadata(path)
            .map_err(|e| WindroseError::CacheMetadataRead(path.to_path_buf(), e))?;
        let modified = metadata
            .modified()
            .map_err(|e| WindroseError::CacheMetadataRead(path.to_path_buf(), e))?;
        SystemTime::now()
            .duration_since(modified)
            .map_err(|e| WindroseError::CacheAgeCalculation(path.to_path_buf(), e))
    }
}

fn read_table(path: &Path) -> Result<ForecastTable, WindroseError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| WindroseError::CacheRead(path.to_path_buf(), e))?;

    let mut records = Vec::new();
    for row in reader.deserialize::<ForecastRecord>() {
        let record =
            row.map_err(|e| WindroseError::format(format!("cache file '{}'", path.display()), e))?;
        records.push(record);
    }
    Ok(ForecastTable::new(records))
}

fn write_table(path: &Path, table: &ForecastTable) -> Result<(), WindroseError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| WindroseError::CacheWrite(path.to_path_buf(), e))?;

    for record in table.records() {
        writer
            .serialize(record)
            .map_err(|e| WindroseError::CacheWrite(path.to_path_buf(), e))?;
    }
    writer
        .flush()
        .map_err(|e| WindroseError::CacheWrite(path.to_path_buf(), csv::Error::from(e)))?;
    Ok(())
}
