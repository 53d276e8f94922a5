//! # vectorm-core
//!
//! Foundation types for the vectorm engine. This crate has no dependencies on
//! other vectorm crates and provides the pieces everything else builds on.
//!
//! ## Modules
//!
//! - [`error`] - The [`OrmError`] taxonomy and the [`OrmResult`] alias
//! - [`value`] - The backend-agnostic [`Value`] enum
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use error::{OrmError, OrmResult, RecordSnapshot};
pub use value::Value;
