//! Error types for the throughput engine.
//!
//! Only run-level failures are errors. Degenerate groups, zero variance and
//! missing normalization constants are handled by policy and surface as
//! fields of the report, and per-group failures are reported as
//! [`GroupFailure`](crate::report::GroupFailure) records.

use thiserror::Error;

/// Main error type for engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// One or more required columns are absent from an input table.
    #[error("{table} table is missing required column(s): {}", columns.join(", "))]
    MissingColumns {
        /// Which input table failed validation (`measurement` or `lookup`).
        table: &'static str,
        /// Header names that were expected but not found.
        columns: Vec<String>,
    },

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization of a config or report failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
