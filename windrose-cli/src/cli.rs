use clap::Parser;
use std::path::PathBuf;

use windrose_core::chart::ChartOptions;
use windrose_core::config::{Config, Overrides};
use windrose_core::model::DATETIME_FORMAT;
use windrose_core::{fetch_weather_data, plot_windrose};

/// Top-level CLI struct.
///
/// Running with no arguments performs the full fetch-then-render sequence
/// for the configured location; every flag is an optional override.
#[derive(Debug, Parser)]
#[command(name = "windrose", version, about = "Wind rose plotter")]
pub struct Cli {
    /// City to fetch the forecast for.
    #[arg(long)]
    pub city: Option<String>,

    /// Latitude; must be combined with --lon. Ignored when a city is
    /// configured at the same precedence.
    #[arg(long, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude; must be combined with --lat.
    #[arg(long, requires = "lat")]
    pub lon: Option<f64>,

    /// Cache freshness threshold in hours.
    #[arg(long)]
    pub cache_hours: Option<u64>,

    /// Directory holding the cached forecast CSV files.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Directory the chart PNG is written to.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Do not open the saved chart in the image viewer.
    #[arg(long)]
    pub no_show: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let overrides = Overrides {
            city: self.city,
            lat: self.lat,
            lon: self.lon,
            cache_hours: self.cache_hours,
            cache_dir: self.cache_dir,
            output_dir: self.output_dir,
            no_show: self.no_show,
        };
        let config = Config::load(&overrides)?;
        let label = config.location.label();
        tracing::debug!(
            location = %label,
            cache_dir = %config.cache_dir.display(),
            output_dir = %config.output_dir.display(),
            "configuration resolved"
        );

        let table = fetch_weather_data(&config).await?;
        println!("Fetched {} forecast records for {label}", table.len());
        for record in table.records().iter().take(5) {
            println!(
                "  {}  speed {:>5.2} m/s  direction {:>5.1} deg",
                record.datetime.format(DATETIME_FORMAT),
                record.speed,
                record.direction
            );
        }

        let options = ChartOptions::from_config(&config);
        let path = plot_windrose(&table, &label, &options)?;
        println!("Wind rose saved to: {}", path.display());

        Ok(())
    }
}
