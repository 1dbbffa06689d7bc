//! Trellis Core
//!
//! Core types shared by the Trellis construct library.
//!
//! This crate contains:
//! - Domain types: resource handles, descriptors, naming scopes, alarm definitions
//! - DTOs: the deployment manifest handed over to a provisioning engine

pub mod domain;
pub mod dto;
