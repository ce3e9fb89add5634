//! Error types for query building and compilation.

use thiserror::Error;

use crate::parser::ParseError;

/// Errors raised while building, compiling or running a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A column, table or join fragment could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A builder method received arguments it cannot represent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The grammar has no rendering for the requested feature.
    #[error("{grammar} grammar does not support {feature}")]
    Unsupported {
        /// Name of the grammar that rejected the feature.
        grammar: &'static str,
        /// Human readable description of the feature.
        feature: String,
    },

    /// A nested predicate was rendered twice within one compilation.
    #[error("nested predicate has already been visited")]
    AlreadyVisited,

    /// The aggregate helpers found no `aggregate` column in the result.
    #[error("aggregate query returned no aggregate column")]
    MissingAggregate,

    /// A processor expected a column the result row does not have.
    #[error("result row has no [{0}] column")]
    MissingColumn(String),

    /// Error raised by a connection implementation.
    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl QueryError {
    /// Creates an [`QueryError::Unsupported`] error.
    #[must_use]
    pub fn unsupported(grammar: &'static str, feature: impl Into<String>) -> Self {
        Self::Unsupported {
            grammar,
            feature: feature.into(),
        }
    }

    /// Wraps a driver error.
    #[must_use]
    pub fn connection(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Connection(Box::new(err))
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
