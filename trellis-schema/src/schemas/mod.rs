//! Pattern schemas
//!
//! Reusable fragments live in [`base`]; the remaining modules assemble them
//! into one schema per pattern.

pub mod analytics;
pub mod api;
pub mod base;
pub mod clusters;
pub mod identity;
pub mod iot;
pub mod messaging;
