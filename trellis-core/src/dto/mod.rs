//! Data Transfer Objects
//!
//! Serializable views of a synthesized resource graph, meant to be handed
//! to whatever applies the deployment.

pub mod manifest;
