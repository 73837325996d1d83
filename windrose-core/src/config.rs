use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{env, fs, path::PathBuf, time::Duration};

use crate::model::Location;

pub const DEFAULT_CACHE_MAX_AGE_HOURS: u64 = 24;
pub const DEFAULT_CACHE_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "windrose_plots";

/// Resolved runtime configuration.
///
/// Constructed once at startup and never mutated afterwards; both pipeline
/// stages borrow it read-only.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenWeatherMap API key.
    pub api_key: String,
    pub location: Location,
    /// Maximum cache age before a re-fetch.
    pub cache_max_age: Duration,
    /// Directory holding one forecast CSV per location.
    pub cache_dir: PathBuf,
    /// Directory the chart PNGs are written to.
    pub output_dir: PathBuf,
    /// Open the saved chart in the platform image viewer.
    pub show_chart: bool,
}

/// Partial configuration from one source (TOML file or environment); all
/// fields optional. Example TOML:
///
/// ```toml
/// api_key = "..."
/// city = "München"
/// cache_hours = 24
/// output_dir = "windrose_plots"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub cache_hours: Option<u64>,
    pub cache_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub show_chart: Option<bool>,
}

/// Command-line overrides; highest precedence source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub cache_hours: Option<u64>,
    pub cache_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub no_show: bool,
}

impl FileConfig {
    /// Load the first config file found: `$WINDROSE_CONFIG`, then
    /// `./windrose.toml`, then the platform config directory. Missing file
    /// means an empty config, not an error.
    pub fn load() -> Result<Self> {
        let mut candidates = Vec::new();
        if let Some(path) = env::var_os("WINDROSE_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        candidates.push(PathBuf::from("windrose.toml"));
        if let Some(dirs) = ProjectDirs::from("dev", "windrose", "windrose-cli") {
            candidates.push(dirs.config_dir().join("windrose.toml"));
        }

        for path in candidates {
            if path.exists() {
                let contents = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                let cfg: FileConfig = toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
                return Ok(cfg);
            }
        }

        Ok(Self::default())
    }

    /// Reads the environment into the same optional shape as a config file.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: env_string("OWM_API_KEY"),
            city: env_string("WINDROSE_CITY"),
            lat: env_parse("WINDROSE_LAT")?,
            lon: env_parse("WINDROSE_LON")?,
            cache_hours: env_parse("WINDROSE_CACHE_HOURS")?,
            cache_dir: env_string("WINDROSE_CACHE_DIR").map(PathBuf::from),
            output_dir: env_string("WINDROSE_OUTPUT_DIR").map(PathBuf::from),
            show_chart: env_string("WINDROSE_SHOW").map(|v| parse_flag(&v)),
        })
    }
}

impl Config {
    /// Load and merge configuration from all sources. Precedence, highest
    /// first: CLI flags, environment (a `.env` file is honored), TOML file,
    /// built-in defaults.
    pub fn load(cli: &Overrides) -> Result<Self> {
        dotenvy::dotenv().ok();
        let file = FileConfig::load()?;
        let env = FileConfig::from_env()?;
        Self::resolve(file, env, cli)
    }

    /// Pure merge step, split out from [`Config::load`] so it can be tested
    /// without touching the process environment.
    pub fn resolve(file: FileConfig, env: FileConfig, cli: &Overrides) -> Result<Self> {
        let api_key = env.api_key.or(file.api_key).ok_or_else(|| {
            anyhow!(
                "Missing OpenWeatherMap API key.\n\
                 Hint: set OWM_API_KEY in the environment or a .env file."
            )
        })?;

        let location = location_of(cli.city.clone(), cli.lat, cli.lon)?
            .or(location_of(env.city, env.lat, env.lon)?)
            .or(location_of(file.city, file.lat, file.lon)?)
            .ok_or_else(|| {
                anyhow!(
                    "No location configured.\n\
                     Hint: set WINDROSE_CITY, or WINDROSE_LAT and WINDROSE_LON."
                )
            })?;

        let cache_hours = cli
            .cache_hours
            .or(env.cache_hours)
            .or(file.cache_hours)
            .unwrap_or(DEFAULT_CACHE_MAX_AGE_HOURS);

        let cache_dir = cli
            .cache_dir
            .clone()
            .or(env.cache_dir)
            .or(file.cache_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));

        let output_dir = cli
            .output_dir
            .clone()
            .or(env.output_dir)
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let show_chart = if cli.no_show {
            false
        } else {
            env.show_chart.or(file.show_chart).unwrap_or(true)
        };

        Ok(Self {
            api_key,
            location,
            cache_max_age: Duration::from_secs(cache_hours * 3600),
            cache_dir,
            output_dir,
            show_chart,
        })
    }
}

/// Builds a location from one source. A city wins over coordinates within
/// the same source; a lone latitude or longitude is a configuration error.
fn location_of(city: Option<String>, lat: Option<f64>, lon: Option<f64>) -> Result<Option<Location>> {
    if let Some(city) = city {
        return Ok(Some(Location::City(city)));
    }
    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok(Some(Location::Coords { lat, lon })),
        (None, None) => Ok(None),
        _ => Err(anyhow!(
            "Latitude and longitude must be configured together."
        )),
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("Invalid value for {key}: {e}")),
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
