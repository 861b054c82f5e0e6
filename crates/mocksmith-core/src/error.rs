use thiserror::Error;

use crate::validation::ValidationReport;

/// Core error type shared across Mocksmith crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The top-level input is not a JSON object.
    #[error("{0}")]
    SchemaType(String),
    /// The schema document violates the document contract.
    #[error("invalid schema: {}", .0.summary())]
    InvalidSchema(ValidationReport),
    /// The settings file could not be decoded or encoded.
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results returned by Mocksmith crates.
pub type Result<T> = std::result::Result<T, Error>;
