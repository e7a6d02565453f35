//! Error types for the evolutionary backtesting engine.

use thiserror::Error;

/// Result type alias for consistent error handling throughout the crate.
pub type Result<T> = std::result::Result<T, EvotradeError>;

/// Main error type for backtesting and evolution operations.
///
/// Most degraded conditions (short price history, degenerate moving-average
/// periods, an empty population) are handled locally and never surface here;
/// the variants below are reserved for violated preconditions and I/O
/// failures on the ingestion and export paths.
#[derive(Debug, Error)]
pub enum EvotradeError {
    /// A gene fell outside the normalized unit interval. This indicates a
    /// corrupted genome produced outside the breeding operators.
    #[error("malformed genome: gene `{gene}` = {value} is outside [0, 1]")]
    MalformedGenome {
        /// Name of the offending gene.
        gene: &'static str,
        /// Observed gene value.
        value: f64,
    },

    /// CSV processing errors on the price-history ingestion path.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO errors while reading price data or writing reports.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors while exporting generation history.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvotradeError {
    /// Create a new malformed-genome error.
    pub fn malformed_genome(gene: &'static str, value: f64) -> Self {
        Self::MalformedGenome { gene, value }
    }

    /// Get error category for logging and monitoring.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedGenome { .. } => "genome",
            Self::Csv(_) => "csv",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}
