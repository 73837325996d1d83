//! Core library for the `windrose` CLI.
//!
//! This crate defines:
//! - Configuration handling (TOML file, `.env`, environment, CLI overrides)
//! - The forecast data provider with its CSV cache
//! - Wind rose histogram computation and chart rendering
//!
//! It is used by `windrose-cli`, but can also be reused by other binaries or
//! services.

pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use cache::ForecastCache;
pub use chart::{ChartOptions, WindroseHistogram, chart_filename, plot_windrose};
pub use config::{Config, FileConfig, Overrides};
pub use error::WindroseError;
pub use model::{ForecastRecord, ForecastTable, Location};
pub use provider::{ForecastProvider, fetch_weather_data, fetch_with_provider};
