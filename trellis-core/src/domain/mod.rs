//! Core domain types
//!
//! This module contains the structures every other Trellis crate speaks in.
//! Builders produce them, the provisioning engine stores them, and the
//! manifest DTO is rendered from them.

pub mod alarm;
pub mod naming;
pub mod resource;
