//! Trellis Schema
//!
//! Declarative configuration schemas and the validator that checks
//! configurations against them.
//! It includes:
//! - A predicate model (`Schema`, `Field`, `Predicate`)
//! - A recursive, path-tracking validator
//! - Typed extraction of validated sub-mappings
//! - One schema per supported pattern, collected in a static registry

pub mod error;
pub mod registry;
pub mod schema;
pub mod schemas;
pub mod validator;

pub use error::ConfigurationError;
pub use registry::{PatternKind, SchemaRegistry, standard_registry};
pub use schema::{Field, Predicate, Schema};
pub use validator::{extract, validate};
