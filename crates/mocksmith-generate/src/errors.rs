use thiserror::Error;

/// Errors emitted by generators and the row generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{}", unknown_generator_message(.generator, .column.as_deref()))]
    UnknownGenerator {
        generator: String,
        column: Option<String>,
    },
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{generator}: {message}")]
    Provider { generator: String, message: String },
    #[error("Exception at column {column}, {source}")]
    Column {
        column: String,
        #[source]
        source: Box<GenerationError>,
    },
}

impl GenerationError {
    pub fn provider(generator: &str, message: impl Into<String>) -> Self {
        Self::Provider {
            generator: generator.to_string(),
            message: message.into(),
        }
    }

    /// Attach the column being generated, keeping unknown-generator errors flat.
    pub fn in_column(self, column: &str) -> Self {
        match self {
            Self::UnknownGenerator { generator, .. } => Self::UnknownGenerator {
                generator,
                column: Some(column.to_string()),
            },
            Self::Column { .. } => self,
            other => Self::Column {
                column: column.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Innermost error, skipping column decoration.
    pub fn root(&self) -> &GenerationError {
        match self {
            Self::Column { source, .. } => source.root(),
            other => other,
        }
    }
}

fn unknown_generator_message(generator: &str, column: Option<&str>) -> String {
    match column {
        Some(column) => {
            format!("Exception at column {column}, '{generator}' is not a valid data type")
        }
        None => format!("'{generator}' is not a valid data type"),
    }
}
