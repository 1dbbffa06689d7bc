//! Resource builders
//!
//! One builder per resource kind. Each takes the build context and a typed
//! configuration struct and returns the handles it declared.

pub mod alarm;
pub mod analytics;
pub mod api;
pub mod bucket;
pub mod function;
pub mod iot_policy;
pub mod messaging;
pub mod role;
pub mod rule;
pub mod subscription;
pub mod table;
pub mod user_pool;
