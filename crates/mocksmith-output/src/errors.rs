use std::error::Error as _;

use thiserror::Error;

/// Errors raised while rendering a dataset.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("You must provide a template for file format '{0}'.")]
    UnsupportedFormat(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("template error: {0}")]
    Template(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rendered output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

impl From<tera::Error> for FormatError {
    fn from(err: tera::Error) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        FormatError::Template(message)
    }
}
