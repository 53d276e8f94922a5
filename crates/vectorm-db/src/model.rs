//! Model trait and schema metadata.
//!
//! The [`Model`] trait is the core abstraction implemented by every typed
//! collection mapping. [`ModelSchema`] is the explicit, ordered descriptor
//! table for a model's fields: it is built once per model through
//! [`SchemaBuilder`], validated at build time, and immutable thereafter —
//! there is no runtime field addition.
//!
//! # Examples
//!
//! ```
//! use std::sync::LazyLock;
//! use vectorm_db::client::Row;
//! use vectorm_db::fields::{FieldDef, FieldType};
//! use vectorm_db::model::{Model, ModelSchema};
//! use vectorm_db::{OrmResult, Value};
//!
//! struct Article {
//!     id: Option<i64>,
//!     title: String,
//!     persisted: bool,
//! }
//!
//! impl Model for Article {
//!     fn schema() -> &'static ModelSchema {
//!         static SCHEMA: LazyLock<ModelSchema> = LazyLock::new(|| {
//!             ModelSchema::builder("Article", "articles")
//!                 .field(FieldDef::new("id", FieldType::Int64).primary_key().auto_id())
//!                 .field(FieldDef::new("title", FieldType::VarChar).max_length(200))
//!                 .build()
//!                 .expect("valid Article schema")
//!         });
//!         &SCHEMA
//!     }
//!
//!     fn field_values(&self) -> Vec<(&'static str, Value)> {
//!         vec![
//!             ("id", Value::from(self.id)),
//!             ("title", Value::from(self.title.clone())),
//!         ]
//!     }
//!
//!     fn from_row(row: &Row) -> OrmResult<Self> {
//!         Ok(Self {
//!             id: row.get("id")?,
//!             title: row.get("title")?,
//!             persisted: true,
//!         })
//!     }
//!
//!     fn pk(&self) -> Option<Value> {
//!         self.id.map(Value::Int)
//!     }
//!     fn set_pk(&mut self, value: Value) {
//!         self.id = value.as_int();
//!     }
//!     fn is_persisted(&self) -> bool {
//!         self.persisted
//!     }
//!     fn set_persisted(&mut self, persisted: bool) {
//!         self.persisted = persisted;
//!     }
//! }
//! ```

use vectorm_core::{OrmError, OrmResult, Value};

use crate::client::Row;
use crate::fields::FieldDef;
use crate::query::QuerySet;

/// The validated, immutable schema of a model.
///
/// An ordered mapping from field name to [`FieldDef`], plus the target
/// collection name and the connection alias queries resolve against.
/// Built through [`ModelSchema::builder`]; every invariant (unique names,
/// exactly one primary key, sound field declarations, valid defaults) is
/// checked once at build time.
#[derive(Debug)]
pub struct ModelSchema {
    model: &'static str,
    collection: &'static str,
    alias: &'static str,
    fields: Vec<FieldDef>,
    primary_key: &'static str,
}

impl ModelSchema {
    /// Starts building a schema for `model` stored in `collection`.
    pub fn builder(model: &'static str, collection: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            model,
            collection,
            alias: "default",
            fields: Vec::new(),
        }
    }

    /// The model name (used in error reporting).
    pub const fn model(&self) -> &'static str {
        self.model
    }

    /// The storage collection this model maps to.
    pub const fn collection(&self) -> &'static str {
        self.collection
    }

    /// The connection alias queries resolve by default.
    pub const fn alias(&self) -> &'static str {
        self.alias
    }

    /// The fields, in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The primary-key field.
    pub fn primary_key(&self) -> &FieldDef {
        self.fields
            .iter()
            .find(|f| f.name == self.primary_key)
            .expect("schema invariant: primary key field exists")
    }

    /// The declared field names, in order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Validates every declared field present in a storage row.
    ///
    /// Fields absent from the row are skipped (projections return fewer
    /// columns); extra row columns (such as the search distance) are ignored.
    ///
    /// # Errors
    ///
    /// Returns the field's own [`OrmError::Validation`] on the first failing
    /// cell.
    pub fn validate_row(&self, row: &Row) -> OrmResult<()> {
        for field in &self.fields {
            if let Some(value) = row.get_value(field.name) {
                field.validate_value(Some(value))?;
            }
        }
        Ok(())
    }
}

/// Builder for [`ModelSchema`]. Terminates in [`build`](Self::build), where
/// all declaration validation happens.
#[derive(Debug)]
pub struct SchemaBuilder {
    model: &'static str,
    collection: &'static str,
    alias: &'static str,
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    /// Sets the connection alias (defaults to `"default"`).
    #[must_use]
    pub const fn alias(mut self, alias: &'static str) -> Self {
        self.alias = alias;
        self
    }

    /// Appends a field declaration.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates and freezes the schema.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Schema`] for duplicate field names, zero or more
    /// than one primary key, an unsound field declaration, or a default value
    /// that fails its own field's validation.
    pub fn build(self) -> OrmResult<ModelSchema> {
        if self.fields.is_empty() {
            return Err(OrmError::Schema(format!(
                "model '{}' declares no fields",
                self.model
            )));
        }

        let mut primary_key = None;
        for (i, field) in self.fields.iter().enumerate() {
            field.check()?;

            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(OrmError::Schema(format!(
                    "model '{}' declares field '{}' more than once",
                    self.model, field.name
                )));
            }

            if field.primary_key {
                if primary_key.is_some() {
                    return Err(OrmError::Schema(format!(
                        "model '{}' declares more than one primary key",
                        self.model
                    )));
                }
                primary_key = Some(field.name);
            }

            if let Some(default) = &field.default {
                field.validate_value(Some(default)).map_err(|err| {
                    OrmError::Schema(format!(
                        "default for field '{}' is invalid: {err}",
                        field.name
                    ))
                })?;
            }
        }

        let primary_key = primary_key.ok_or_else(|| {
            OrmError::Schema(format!(
                "model '{}' declares no primary key",
                self.model
            ))
        })?;

        Ok(ModelSchema {
            model: self.model,
            collection: self.collection,
            alias: self.alias,
            fields: self.fields,
            primary_key,
        })
    }
}

/// The core trait for typed collection mappings.
///
/// Implementors hold one value per declared field plus a persisted flag
/// distinguishing "not yet saved" from "saved and unchanged". The schema is
/// fixed at definition time via a `static` [`ModelSchema`].
pub trait Model: Send + Sync + Sized + 'static {
    /// Returns the static schema for this model type.
    fn schema() -> &'static ModelSchema;

    /// Returns all field name-value pairs for this instance, in schema order.
    fn field_values(&self) -> Vec<(&'static str, Value)>;

    /// Constructs an instance from a storage row. The row has already passed
    /// schema validation when called by the engine.
    fn from_row(row: &Row) -> OrmResult<Self>;

    /// Returns the primary key value, or `None` if not yet assigned.
    fn pk(&self) -> Option<Value>;

    /// Sets the primary key value (used after an auto-id insert).
    fn set_pk(&mut self, value: Value);

    /// Whether this instance corresponds to a stored record.
    fn is_persisted(&self) -> bool;

    /// Marks this instance as persisted or not.
    fn set_persisted(&mut self, persisted: bool);

    /// The model name, as used in error reporting.
    fn model_name() -> &'static str {
        Self::schema().model()
    }

    /// The storage collection name.
    fn collection_name() -> &'static str {
        Self::schema().collection()
    }

    /// The default connection alias.
    fn connection_alias() -> &'static str {
        Self::schema().alias()
    }

    /// Returns a fresh, unevaluated query set over this model's collection.
    fn objects() -> QuerySet<Self> {
        QuerySet::new()
    }

    /// Assembles a validated wire row from this instance's field values.
    ///
    /// An auto-assigned primary key that is still unset is omitted from the
    /// row so the storage layer can assign it.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] if any field value fails its field's
    /// constraints.
    fn to_row(&self) -> OrmResult<Row> {
        let values = self.field_values();
        let mut columns = Vec::new();
        let mut cells = Vec::new();
        for field in Self::schema().fields() {
            let raw = values
                .iter()
                .find(|(name, _)| *name == field.name)
                .map(|(_, value)| value);
            let validated = field.validate_value(raw)?;
            if field.auto_id && validated.is_null() {
                continue;
            }
            columns.push(field.name.to_string());
            cells.push(validated);
        }
        Ok(Row::new(columns, cells))
    }
}
