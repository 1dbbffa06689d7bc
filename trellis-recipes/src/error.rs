//! Error types for pattern composition

use thiserror::Error;
use trellis_core::domain::resource::ResourceKind;
use trellis_engine::EngineError;
use trellis_schema::ConfigurationError;

/// Result type alias for builders and composers
pub type Result<T> = std::result::Result<T, RecipeError>;

/// Fatal composition errors
///
/// Any of these aborts the composition immediately. Resources declared
/// before the failure stay in the graph.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// Configuration failed schema validation or typed extraction
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A closed-set value (runtime, HTTP method, ...) was not recognised
    #[error("Unsupported value '{value}' for '{field}'")]
    UnsupportedEnumValue { field: String, value: String },

    /// A conditional sub-resource the pattern needs was not configured
    #[error("Missing required sub-resource: {0}")]
    MissingRequiredSubResource(String),

    /// The provisioning engine rejected a declaration
    #[error("Provisioning failed: {0}")]
    Engine(#[from] EngineError),
}

impl RecipeError {
    /// Create an unsupported enum value error
    pub fn unsupported(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnsupportedEnumValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a missing sub-resource error
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingRequiredSubResource(what.into())
    }

    /// Check if this error comes from schema validation
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Reasons a single alarm is skipped
///
/// Never fatal: alarm attachment logs these and moves on.
#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("Malformed alarm definition: {0}")]
    Malformed(String),

    #[error("Invalid alarm definition: {0}")]
    Invalid(String),

    #[error("{kind} '{name}' has no alarmable metrics")]
    NotAlarmable { name: String, kind: ResourceKind },

    #[error(transparent)]
    Engine(#[from] EngineError),
}
