//! Error types for the data-loader crate.
//!
//! Everything in here is fatal to a training run: if the dataset cannot be
//! read or does not validate, there is nothing to fit.

use thiserror::Error;

/// Errors that can occur while loading, validating or splitting the dataset
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// Dataset directory or a required file is missing
    #[error("Dataset unavailable: {path} not found")]
    DataUnavailable { path: String },

    /// I/O error occurred while reading a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected a record (bad quoting, wrong field count, ...)
    #[error("CSV error in {file}: {source}")]
    CsvError {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// A record was well-formed CSV but a field could not be interpreted
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field or parameter had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g., rating for non-existent movie)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u32 },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
