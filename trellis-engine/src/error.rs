//! Error types for the provisioning engine

use thiserror::Error;
use trellis_core::domain::resource::ResourceKind;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised while declaring resources, dependencies or policies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Logical id is empty or blank
    #[error("Invalid resource identifier: '{0}'")]
    InvalidIdentifier(String),

    /// A resource with the same logical id already exists
    #[error("Resource '{0}' is already declared")]
    DuplicateResource(String),

    /// Handle does not belong to this graph
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Dependency target was not declared before the dependent
    #[error("Resource '{from}' cannot depend on '{to}', which was not declared before it")]
    ForwardReference {
        /// Dependent resource
        from: String,
        /// Resource depended upon
        to: String,
    },

    /// Properties were not a JSON object
    #[error("Properties of '{0}' must be an object")]
    InvalidProperties(String),

    /// Reference resource declared without an `arn` property
    #[error("Reference resource '{0}' requires an 'arn' property")]
    MissingReferenceArn(String),

    /// Policies can only go on roles and functions
    #[error("Cannot attach a policy to {kind} '{name}'")]
    PolicyNotSupported {
        /// Target resource name
        name: String,
        /// Target resource kind
        kind: ResourceKind,
    },

    /// Statement without actions or resources
    #[error("Policy statement for '{0}' needs at least one action and one resource")]
    EmptyPolicy(String),
}

impl EngineError {
    /// Create a forward reference error from two resource names
    pub fn forward_reference(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::ForwardReference {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Check if this error is a naming collision
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateResource(_))
    }
}
