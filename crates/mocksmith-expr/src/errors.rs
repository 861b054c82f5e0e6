use std::fmt;

use thiserror::Error;

/// Category of a runtime failure, mirroring the classic exception kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Type,
    Value,
    ZeroDivision,
    Index,
    Key,
    Overflow,
    Generation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Type => "TypeError",
            ErrorKind::Value => "ValueError",
            ErrorKind::ZeroDivision => "ZeroDivisionError",
            ErrorKind::Index => "IndexError",
            ErrorKind::Key => "KeyError",
            ErrorKind::Overflow => "OverflowError",
            ErrorKind::Generation => "GenerationError",
        };
        f.write_str(name)
    }
}

/// Failure while evaluating one expression.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EvalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Value, message)
    }

    pub fn overflow() -> Self {
        Self::new(ErrorKind::Overflow, "integer overflow")
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ZeroDivision, message)
    }
}

/// Expression that is whitelisted but does not form a valid expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct SyntaxError {
    pub message: String,
    pub position: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Errors surfaced by column post-processing.
#[derive(Debug, Error)]
pub enum ExprError {
    #[error("Column(s) {} does not contain supported functions", .columns.join(", "))]
    Unsafe { columns: Vec<String> },
    #[error("Exception for column '{column}', function has invalid syntax ({source})")]
    Syntax {
        column: String,
        #[source]
        source: SyntaxError,
    },
    #[error("Exception for column '{column}', {source}")]
    Runtime {
        column: String,
        #[source]
        source: EvalError,
    },
}

impl ExprError {
    /// Kind of the underlying runtime failure, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ExprError::Runtime { source, .. } => Some(source.kind),
            _ => None,
        }
    }

    pub fn column(&self) -> Option<&str> {
        match self {
            ExprError::Unsafe { .. } => None,
            ExprError::Syntax { column, .. } | ExprError::Runtime { column, .. } => Some(column),
        }
    }
}
