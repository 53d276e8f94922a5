//! # vectorm-db
//!
//! The engine layer of vectorm. Provides the [`Model`](model::Model) trait for
//! defining typed collection schemas, [`QuerySet`](query::QuerySet) for building
//! and executing lazy queries, the expression compiler that renders predicate
//! trees into the storage layer's boolean-expression grammar, and the mutation
//! orchestrator implementing save/delete/bulk-create on a storage engine with
//! no native update primitive.
//!
//! ## Architecture
//!
//! The engine is designed around lazy evaluation over immutable specifications.
//! A [`QuerySet`](query::QuerySet) records intended operations (filters,
//! ordering, pagination, a vector-search directive) in a
//! [`QuerySpec`](query::QuerySpec) without touching the network. A terminal
//! call compiles the predicate tree, resolves the model's connection alias
//! through the [`registry`], issues a single request through the
//! [`VectorClient`](client::VectorClient) boundary, and materializes typed
//! model instances from the returned rows. Results are cached: evaluating the
//! same `QuerySet` twice issues at most one request.
//!
//! Updates are delete-then-insert: the storage layer has no in-place update,
//! so `save()` on a persisted instance deletes by primary key and re-inserts.
//! The two steps are not atomic; see [`mutation::save`] for the failure
//! contract.
//!
//! ## Module Overview
//!
//! - [`model`] - The [`Model`](model::Model) trait and [`ModelSchema`](model::ModelSchema)
//! - [`fields`] - Field definitions ([`FieldDef`](fields::FieldDef)) and types
//! - [`query`] - Predicate trees, expression compilation, and the lazy `QuerySet`
//! - [`mutation`] - save/delete/bulk-create orchestration
//! - [`client`] - The narrow async boundary to the storage layer
//! - [`registry`] - Alias-to-client connection registry

// These clippy lints are intentionally allowed for the engine crate:
// - struct_excessive_bools: FieldDef mirrors a declarative field API with flag options
// - result_large_err: OrmError is the engine error type and is used consistently
// - return_self_not_must_use: builder pattern methods are self-documenting
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::result_large_err)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::doc_markdown)]

pub mod client;
pub mod fields;
pub mod model;
pub mod mutation;
pub mod query;
pub mod registry;

// Re-export the most commonly used types at the crate root.
pub use client::{FromValue, InsertResult, Row, ScalarQuery, VectorClient, VectorSearch};
pub use fields::{FieldDef, FieldType};
pub use model::{Model, ModelSchema, SchemaBuilder};
pub use mutation::{
    bulk_create, bulk_create_using, delete, delete_using, insert_snapshot, save, save_using,
};
pub use query::{Lookup, OrderBy, Q, QuerySet, QuerySpec, SearchDirective, DISTANCE_FIELD};
pub use registry::{register, resolve};
pub use vectorm_core::{OrmError, OrmResult, RecordSnapshot, Value};
