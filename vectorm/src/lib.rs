//! # vectorm
//!
//! A Django-style declarative model and lazy query layer for vector databases.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. You can depend on `vectorm` to get the whole engine, or depend on
//! the individual crates for finer-grained control.
//!
//! # Examples
//!
//! ```ignore
//! use vectorm::prelude::*;
//!
//! let hits = Article::objects()
//!     .filter(Q::filter("title", Lookup::Contains("Python".into())))?
//!     .search(query_vector, "embedding", "L2", 10)?
//!     .all()
//!     .await?;
//! ```

/// Foundation types: error taxonomy, values, logging setup.
pub use vectorm_core as core;

/// The engine: models, fields, query sets, compilation, and mutations.
pub use vectorm_db as db;

/// The most commonly used types, importable in one line.
pub mod prelude {
    pub use vectorm_core::{OrmError, OrmResult, RecordSnapshot, Value};
    pub use vectorm_db::{
        bulk_create, delete, insert_snapshot, save, FieldDef, FieldType, Lookup, Model,
        ModelSchema, QuerySet, Row, VectorClient, Q,
    };
}
