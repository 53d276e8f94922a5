//! Core error types for the vectorm engine.
//!
//! This module provides the [`OrmError`] enum that covers every failure kind
//! the engine can surface: schema declaration problems, value validation,
//! illegal query chains, expression compilation, connection lookup, lookup
//! misses, and mutation failures.
//!
//! The engine never retries on its own. Every error is propagated to the
//! caller unmodified; in particular [`OrmError::UpdateFailed`] carries the
//! pre-delete [`RecordSnapshot`] so the caller can decide to re-issue the
//! lost insert.

use thiserror::Error;

use crate::value::Value;

/// The field values of a record captured before a destructive operation.
///
/// Carried by [`OrmError::UpdateFailed`] when the delete half of an update
/// succeeded but the re-insert did not: the record named here no longer
/// exists in the collection, and `values` is the only remaining copy.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecordSnapshot {
    /// The collection the record was deleted from.
    pub collection: String,
    /// Field name-value pairs as they were immediately before the delete.
    pub values: Vec<(String, Value)>,
}

impl RecordSnapshot {
    /// Creates a snapshot for a collection from field name-value pairs.
    pub fn new(collection: impl Into<String>, values: Vec<(String, Value)>) -> Self {
        Self {
            collection: collection.into(),
            values,
        }
    }

    /// Returns the value captured for `field`, if the field was present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

/// The primary error type for the vectorm engine.
///
/// Variants group into when they can occur:
///
/// - **Before any network call**: [`Schema`](Self::Schema),
///   [`Validation`](Self::Validation), [`QueryConfig`](Self::QueryConfig),
///   [`Compile`](Self::Compile). These are raised at declaration, assignment,
///   or chain-build time and never require a round trip to manifest.
/// - **At evaluation time**: [`ConnectionNotFound`](Self::ConnectionNotFound),
///   [`DoesNotExist`](Self::DoesNotExist),
///   [`MultipleObjectsReturned`](Self::MultipleObjectsReturned),
///   [`DataIntegrity`](Self::DataIntegrity), [`Storage`](Self::Storage).
/// - **During mutations**: [`UpdateFailed`](Self::UpdateFailed),
///   [`NotPersisted`](Self::NotPersisted).
///
/// `DoesNotExist` and `MultipleObjectsReturned` carry the model name as data,
/// so different models produce distinguishable errors from a single shared
/// kind.
#[derive(Error, Debug)]
pub enum OrmError {
    /// An invalid field or model declaration (bad dimensionality, duplicate
    /// primary key, malformed search directive, ...).
    #[error("schema error: {0}")]
    Schema(String),

    /// A value failed the owning field's own constraints.
    #[error("validation failed for field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// What the value violated.
        message: String,
    },

    /// An illegal combination of chain calls (sort + search conflict,
    /// zero limit, distance annotation without a search directive, ...).
    #[error("invalid query configuration: {0}")]
    QueryConfig(String),

    /// A predicate tree cannot be rendered into the storage grammar.
    #[error("cannot compile filter expression: {0}")]
    Compile(String),

    /// No client handle is registered under the requested alias.
    #[error("no connection registered under alias '{0}'")]
    ConnectionNotFound(String),

    /// A `get()` matched no rows.
    #[error("{model} matching query does not exist")]
    DoesNotExist {
        /// The model the query ran against.
        model: String,
    },

    /// A `get()` matched more than one row.
    #[error("get() returned more than one {model} -- it returned {count}")]
    MultipleObjectsReturned {
        /// The model the query ran against.
        model: String,
        /// How many rows came back.
        count: usize,
    },

    /// A row returned by the storage layer failed field validation.
    /// A partially-typed result set is worse than none, so this aborts the
    /// whole evaluation.
    #[error("row from collection '{collection}' failed validation for field '{field}': {message}")]
    DataIntegrity {
        /// The collection the row came from.
        collection: String,
        /// The offending field.
        field: String,
        /// What the stored value violated.
        message: String,
    },

    /// The re-insert half of an update failed after the delete half
    /// succeeded. The record is gone from storage; `snapshot` preserves it.
    #[error("update lost record in collection '{}': insert failed after delete: {message}", .snapshot.collection)]
    UpdateFailed {
        /// The pre-delete field values of the lost record.
        snapshot: RecordSnapshot,
        /// The underlying insert failure.
        message: String,
    },

    /// A delete or update was requested on an instance that was never saved.
    #[error("{model} instance is not persisted")]
    NotPersisted {
        /// The model of the unsaved instance.
        model: String,
    },

    /// An error reported by the storage client itself.
    #[error("storage error: {0}")]
    Storage(String),
}

/// A convenience type alias for `Result<T, OrmError>`.
pub type OrmResult<T> = Result<T, OrmError>;
