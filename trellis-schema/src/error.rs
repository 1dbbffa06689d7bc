//! Configuration error types

use thiserror::Error;

/// A configuration that does not satisfy its schema
///
/// Paths are dotted, with list indices in brackets, e.g.
/// `lambda_handlers[0].runtime`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Required key is absent
    #[error("Missing required field '{path}'")]
    MissingField { path: String },

    /// Value does not satisfy the field's predicate
    #[error("Field '{path}' must be {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Value passed validation but could not be read into its typed form
    #[error("Field '{path}' is malformed: {message}")]
    Malformed { path: String, message: String },

    /// No schema is registered for the requested pattern
    #[error("No schema registered for pattern '{0}'")]
    UnknownPattern(String),
}

impl ConfigurationError {
    /// Path of the offending field, if the error has one
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MissingField { path }
            | Self::TypeMismatch { path, .. }
            | Self::Malformed { path, .. } => Some(path),
            Self::UnknownPattern(_) => None,
        }
    }
}
