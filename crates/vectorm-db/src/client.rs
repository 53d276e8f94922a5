//! The narrow async boundary to the storage layer.
//!
//! This module defines the [`VectorClient`] trait that the engine talks to,
//! the wire-level request payloads ([`ScalarQuery`], [`VectorSearch`]) handed
//! to it verbatim, and the [`Row`] type carrying results back. The engine
//! never constructs client handles itself — it looks them up through the
//! [`registry`](crate::registry) at evaluation time.
//!
//! The compiled filter expression and the search parameters are a passthrough:
//! their exact grammar belongs to the storage layer, not to this engine.

use vectorm_core::{OrmError, OrmResult, Value};

/// A scalar (non-search) query request.
///
/// `expr` is the compiled boolean filter expression; the empty string means
/// "match all" per the storage grammar's convention. `limit`/`offset` are
/// present only when the engine chose to push pagination down.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScalarQuery {
    /// The target collection.
    pub collection: String,
    /// Compiled boolean filter expression ("" = match all).
    pub expr: String,
    /// Field names to return; `None` means all declared fields.
    pub output_fields: Option<Vec<String>>,
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
    /// Number of leading rows to skip.
    pub offset: Option<usize>,
}

/// A nearest-neighbor search request.
///
/// Carries the compiled filter expression as its scalar pre-filter. The
/// storage layer returns rows ranked by distance; each returned row includes
/// a distance column (see [`DISTANCE_FIELD`](crate::query::DISTANCE_FIELD)).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VectorSearch {
    /// The target collection.
    pub collection: String,
    /// Compiled scalar pre-filter ("" = no pre-filter).
    pub expr: String,
    /// The vector field to search against.
    pub field: String,
    /// The query vector.
    pub vector: Vec<f32>,
    /// The distance metric, passed through opaquely.
    pub metric: String,
    /// Maximum number of neighbors to retrieve.
    pub top_k: usize,
    /// Field names to return; `None` means all declared fields.
    pub output_fields: Option<Vec<String>>,
}

/// The outcome of an insert request.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InsertResult {
    /// How many rows the storage layer accepted.
    pub insert_count: usize,
    /// Primary keys assigned by the storage layer, in insert order.
    /// Empty when the caller supplied explicit keys.
    pub primary_keys: Vec<Value>,
}

/// A row of values passed between the storage layer and the engine.
///
/// `Row` holds a list of column names and their corresponding values, and
/// provides typed access via [`get`](Row::get).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist or the value cannot be
    /// converted to the requested type.
    pub fn get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self.get_value(column).ok_or_else(|| {
            OrmError::Storage(format!("column '{column}' not found in row"))
        })?;
        T::from_value(value)
    }

    /// Returns a reference to the raw value at the given column name.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Appends a column to the row (used to attach the distance column to
    /// search hits).
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    /// Consumes the row into its (column, value) pairs.
    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.columns.into_iter().zip(self.values).collect()
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> OrmResult<Self>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(OrmError::Storage(format!("expected Int, got {value:?}"))),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Ok(*i as f64),
            _ => Err(OrmError::Storage(format!("expected Float, got {value:?}"))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(OrmError::Storage(format!("expected Bool, got {value:?}"))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(OrmError::Storage(format!("expected String, got {value:?}"))),
        }
    }
}

impl FromValue for Vec<f32> {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Vector(v) => Ok(v.clone()),
            _ => Err(OrmError::Storage(format!("expected Vector, got {value:?}"))),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Json(j) => Ok(j.clone()),
            _ => Err(OrmError::Storage(format!("expected Json, got {value:?}"))),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> OrmResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}

/// Minimal async storage client trait.
///
/// This is the bridge between the engine and a concrete vector-database
/// client. Handles implementing this trait are registered with the
/// [`registry`](crate::registry) by the external connection-management
/// collaborator; the engine only resolves and calls them.
///
/// All methods suspend at the network round trip. The engine performs no
/// cross-request locking on top of this trait — the storage layer offers no
/// multi-statement transactions (see [`mutation::save`](crate::mutation::save)
/// for the consequences).
#[async_trait::async_trait]
pub trait VectorClient: Send + Sync {
    /// Runs a scalar query and returns the matching rows.
    async fn query(&self, request: ScalarQuery) -> OrmResult<Vec<Row>>;

    /// Runs a nearest-neighbor search and returns rows ranked by distance.
    /// Each row must carry a `distance` column alongside the output fields.
    async fn search(&self, request: VectorSearch) -> OrmResult<Vec<Row>>;

    /// Inserts rows into a collection.
    async fn insert(&self, collection: &str, rows: Vec<Row>) -> OrmResult<InsertResult>;

    /// Deletes rows matching the filter expression. Returns the delete count.
    async fn delete(&self, collection: &str, expr: &str) -> OrmResult<u64>;

    /// Runs a dedicated count request, if the storage layer supports one.
    /// Returns `Ok(None)` when it does not, in which case the engine falls
    /// back to evaluating and measuring.
    async fn count(&self, collection: &str, expr: &str) -> OrmResult<Option<u64>> {
        let _ = (collection, expr);
        Ok(None)
    }
}
