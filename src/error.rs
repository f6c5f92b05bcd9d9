use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No historical data file supplied")]
    MissingFileInput,

    #[error("Failed to read historical data from {}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Invalid row at line {line}: {reason}")]
    Parse { line: u64, reason: String },

    #[error("No observations found for {city}")]
    EmptySeries { city: String },

    #[error("Insufficient data: required {required} observations, got {got}")]
    InsufficientData { required: usize, got: usize },

    #[error("Series is not evenly spaced daily data: {previous} is followed by {next}")]
    IrregularSpacing { previous: NaiveDate, next: NaiveDate },

    #[error("Insufficient seasonal data for month {month}: need at least 2 observations, got {got}")]
    InsufficientSeasonalData { month: u32, got: usize },

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("No OpenWeatherMap API key supplied")]
    MissingApiKey,

    #[error("Failed to fetch current weather: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Malformed weather response: {0}")]
    MalformedResponse(String),

    #[error("API error [{code}]: {message}")]
    Api { code: String, message: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
