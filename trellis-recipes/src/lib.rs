//! Trellis Recipes
//!
//! Resource builders, pattern composers and alarm attachment on top of a
//! [`ProvisioningEngine`](trellis_engine::ProvisioningEngine).
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis_core::domain::naming::Scope;
//! use trellis_recipes::patterns::QueuePipe;
//! use trellis_recipes::{Settings, Stack};
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new().with_default_code_path("functions");
//!     let mut stack = Stack::with_settings(Scope::new("acme", "dev"), settings)?;
//!
//!     let pipe: QueuePipe = stack.compose(&json!({
//!         "queue": { "queue_name": "orders" },
//!         "lambda_handlers": [{
//!             "lambda_name": "process",
//!             "runtime": "PYTHON_3_8",
//!             "handler": "app.handler",
//!             "iam_actions": []
//!         }]
//!     }))?;
//!     stack.attach_alarms(&pipe);
//!
//!     let manifest = stack.synthesize();
//!     println!("{}", serde_json::to_string_pretty(&manifest)?);
//!     Ok(())
//! }
//! ```

pub mod alarms;
pub mod builders;
pub mod config;
pub mod context;
pub mod error;
pub mod patterns;
pub mod stack;

pub use alarms::attach_alarms;
pub use config::Settings;
pub use context::Context;
pub use error::{AlarmError, RecipeError, Result};
pub use patterns::{Pattern, compose};
pub use stack::Stack;
