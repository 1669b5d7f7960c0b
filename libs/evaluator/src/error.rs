//! Error types for the evaluation engine

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Query evaluation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Identifier could not be resolved while evaluating in strict mode.
    #[error("Unresolved variable: {0}")]
    UnresolvedVariable(String),

    #[error("Query evaluation error: {0}")]
    Evaluation(String),

    /// The query tree violates an invariant that an upstream transformation promised
    /// (bounded-range marker with a broken range, wrong arity, mismatched fields).
    #[error("Malformed query tree: {0}")]
    MalformedTree(String),

    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    #[error("Failed to fetch field {field}: {message}")]
    Fetch { field: String, message: String },

    #[error("Invalid hit term: {0}")]
    InvalidHitTerm(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Fatal errors indicate a corrupted or mis-transformed query tree.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MalformedTree(_))
    }

    /// Errors that already describe a query-evaluation failure and are passed through
    /// function invocation unchanged.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            Error::Evaluation(_)
                | Error::UnresolvedVariable(_)
                | Error::MalformedTree(_)
                | Error::Fetch { .. }
        )
    }

    pub(crate) fn fetch(field: &str, message: impl Into<String>) -> Self {
        Error::Fetch {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
