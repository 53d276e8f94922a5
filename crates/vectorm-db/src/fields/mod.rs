//! Field definitions for model schemas.
//!
//! See [`types`] for the [`FieldType`] enum and the [`FieldDef`] builder.

pub mod types;

pub use types::{FieldDef, FieldType};
