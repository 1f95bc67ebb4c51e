//! Error types surfaced by ingestion and analytics requests.

use thiserror::Error;

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors that a single request can fail with.
///
/// None of these are fatal to the service; each request fails on its own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// A required request parameter was absent.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// The dataset identifier is unknown or refers to a dataset without rows.
    #[error("invalid or empty dataset: {0}")]
    InvalidDataset(String),

    /// The series name is not one of the inferred series columns.
    #[error("series not found: {0}")]
    SeriesNotFound(String),

    /// The uploaded file could not be read or parsed as delimited text.
    #[error("failed to parse upload: {0}")]
    ParseFailure(String),
}

impl AnalyticsError {
    /// Short machine-readable category used in error responses.
    pub fn category(&self) -> &'static str {
        match self {
            AnalyticsError::MissingParameter(_) => "missing_parameter",
            AnalyticsError::InvalidDataset(_) | AnalyticsError::SeriesNotFound(_) => "not_found",
            AnalyticsError::ParseFailure(_) => "parse_failure",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AnalyticsError::MissingParameter(_) | AnalyticsError::InvalidDataset(_) => 400,
            AnalyticsError::SeriesNotFound(_) => 404,
            AnalyticsError::ParseFailure(_) => 500,
        }
    }
}

impl From<csv::Error> for AnalyticsError {
    fn from(err: csv::Error) -> Self {
        AnalyticsError::ParseFailure(err.to_string())
    }
}

impl From<std::io::Error> for AnalyticsError {
    fn from(err: std::io::Error) -> Self {
        AnalyticsError::ParseFailure(err.to_string())
    }
}
