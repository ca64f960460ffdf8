//! Error types for the Wellplay pipeline

use thiserror::Error;

/// Errors that can occur while loading or transforming study data.
///
/// Structural problems fail the run immediately. Expected missingness
/// (absent start time, absent telemetry for a player, too few items for a
/// straightliner check) is carried as `None` and never surfaces here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    #[error("Unparseable timestamp '{value}' in {table} row {row}")]
    TimestampParseError {
        table: String,
        row: usize,
        value: String,
    },

    #[error("Missing required field '{field}' in {table} row {row}")]
    MissingField {
        table: String,
        row: usize,
        field: String,
    },

    #[error("Empty input table: {0}")]
    EmptyTable(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl PipelineError {
    pub fn missing_column(table: &str, column: &str) -> Self {
        PipelineError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}
