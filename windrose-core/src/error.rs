use std::path::PathBuf;
use thiserror::Error;

/// Error taxonomy for the fetch-then-render pipeline.
///
/// Nothing here is recovered locally: every variant propagates to the top
/// level and terminates the run with a non-zero exit.
#[derive(Debug, Error)]
pub enum WindroseError {
    /// Network-level failure before a response could be read.
    #[error("Network request failed for {0}")]
    Transport(String, #[source] reqwest::Error),

    /// The upstream API answered with a non-success status.
    #[error("HTTP request failed for {url} with status {status}: {body}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    /// A response body or cache file did not match the expected schema.
    #[error("Failed to parse {context}: {message}")]
    Format { context: String, message: String },

    /// The forecast table has zero records; min/max timestamps are undefined.
    #[error("Forecast table contains no records")]
    EmptyData,

    /// Drawing or writing the chart failed.
    #[error("Failed to render chart '{}': {message}", .path.display())]
    Render { path: PathBuf, message: String },

    #[error("Failed to create output directory '{}'", .0.display())]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to create cache directory '{}'", .0.display())]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read metadata for cache file '{}'", .0.display())]
    CacheMetadataRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cache file '{}'", .0.display())]
    CacheRead(PathBuf, #[source] csv::Error),

    #[error("Failed to write cache file '{}'", .0.display())]
    CacheWrite(PathBuf, #[source] csv::Error),

    #[error("Failed to calculate age of cache file '{}'", .0.display())]
    CacheAgeCalculation(PathBuf, #[source] std::time::SystemTimeError),
}

impl WindroseError {
    /// Wraps a parse failure with a short description of what was being
    /// parsed.
    pub fn format(context: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::Format {
            context: context.into(),
            message: source.to_string(),
        }
    }
}
