//! Field type definitions for the engine.
//!
//! This module defines the field type system used by model definitions. Each
//! [`FieldType`] variant corresponds to one of the storage layer's semantic
//! types, and [`FieldDef`] captures all metadata about a single model field.
//!
//! A `FieldDef` owns two validation duties: checking its own declaration
//! (performed once when the owning [`ModelSchema`](crate::model::ModelSchema)
//! is built) and checking values assigned to it (performed on every
//! assignment and on every row returned by the storage layer).

use vectorm_core::{OrmError, OrmResult, Value};

/// The semantic type of a model field.
///
/// Each variant maps to a storage-layer data type. Vector fields carry their
/// dimensionality; everything else is parameterized through [`FieldDef`]
/// options.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum FieldType {
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating-point number (stored widened as f64 engine-side).
    Float,
    /// 64-bit floating-point number.
    Double,
    /// Boolean (true/false).
    Bool,
    /// Variable-length string with a mandatory max length.
    VarChar,
    /// JSON data.
    Json,
    /// Dense float vector with a fixed dimensionality.
    FloatVector {
        /// Number of vector components. Must be positive.
        dim: usize,
    },
}

impl FieldType {
    /// Returns `true` for the floating-point scalar types.
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Returns `true` for vector types.
    pub const fn is_vector(&self) -> bool {
        matches!(self, Self::FloatVector { .. })
    }
}

/// Complete definition of a model field, including metadata and constraints.
///
/// Built with the builder methods and validated when the owning schema is
/// built. All options default off: non-null, no default, not a primary key.
///
/// # Examples
///
/// ```
/// use vectorm_db::fields::{FieldDef, FieldType};
///
/// let id = FieldDef::new("id", FieldType::Int64).primary_key().auto_id();
/// let title = FieldDef::new("title", FieldType::VarChar).max_length(200);
/// let embedding = FieldDef::new("embedding", FieldType::FloatVector { dim: 768 });
/// ```
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The field name, shared by the model attribute and the stored column.
    pub name: &'static str,
    /// The semantic type of this field.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether the storage layer assigns the primary key value on insert.
    pub auto_id: bool,
    /// Whether a null value is allowed.
    pub null: bool,
    /// Default value for new instances and absent row cells.
    pub default: Option<Value>,
    /// Maximum character length (VarChar only).
    pub max_length: Option<usize>,
    /// Human-readable description.
    pub description: String,
}

impl FieldDef {
    /// Creates a new `FieldDef` with default options.
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            primary_key: false,
            auto_id: false,
            null: false,
            default: None,
            max_length: None,
            description: String::new(),
        }
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Lets the storage layer assign this field's value on insert.
    #[must_use]
    pub const fn auto_id(mut self) -> Self {
        self.auto_id = true;
        self
    }

    /// Allows null values.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Sets the maximum character length.
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets the default value for this field.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Returns the declared vector dimensionality, if this is a vector field.
    pub const fn dim(&self) -> Option<usize> {
        match self.field_type {
            FieldType::FloatVector { dim } => Some(dim),
            _ => None,
        }
    }

    /// Validates this field's own declaration.
    ///
    /// Called once per field when the owning schema is built. Default-value
    /// validity is checked separately by the schema builder, after the
    /// declaration itself is known to be sound.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Schema`] for a non-positive vector dimensionality,
    /// a `VarChar` without a positive `max_length`, a `max_length` on a
    /// non-string field, or `auto_id` on anything but an integer primary key.
    pub fn check(&self) -> OrmResult<()> {
        if let FieldType::FloatVector { dim } = self.field_type {
            if dim == 0 {
                return Err(OrmError::Schema(format!(
                    "vector field '{}' must declare a positive dimensionality",
                    self.name
                )));
            }
        }
        match (&self.field_type, self.max_length) {
            (FieldType::VarChar, None | Some(0)) => {
                return Err(OrmError::Schema(format!(
                    "string field '{}' must declare a positive max_length",
                    self.name
                )));
            }
            (FieldType::VarChar, Some(_)) | (_, None) => {}
            (_, Some(_)) => {
                return Err(OrmError::Schema(format!(
                    "max_length is only valid on string fields, not '{}'",
                    self.name
                )));
            }
        }
        if self.auto_id && !(self.primary_key && self.field_type == FieldType::Int64) {
            return Err(OrmError::Schema(format!(
                "auto_id on field '{}' requires an integer primary key",
                self.name
            )));
        }
        Ok(())
    }

    /// Validates a value against this field's type and constraints.
    ///
    /// `None` resolves to the declared default, then to `Null` if the field
    /// is nullable or an auto-assigned primary key. Integers widen to floats
    /// for float fields; a vector whose length differs from the declared
    /// dimensionality is always rejected, never padded or truncated.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] naming this field on any mismatch.
    pub fn validate_value(&self, value: Option<&Value>) -> OrmResult<Value> {
        let value = match value {
            Some(v) if !v.is_null() => v.clone(),
            _ => match &self.default {
                Some(default) => default.clone(),
                None if self.null || self.auto_id => return Ok(Value::Null),
                None => {
                    return Err(self.invalid("a value is required"));
                }
            },
        };

        match (&self.field_type, value) {
            (FieldType::Int64, Value::Int(i)) => Ok(Value::Int(i)),
            (FieldType::Float | FieldType::Double, Value::Float(f)) => Ok(Value::Float(f)),
            #[allow(clippy::cast_precision_loss)]
            (FieldType::Float | FieldType::Double, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (FieldType::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (FieldType::VarChar, Value::String(s)) => {
                let max = self.max_length.unwrap_or(usize::MAX);
                if s.chars().count() > max {
                    return Err(self.invalid(&format!(
                        "string length {} exceeds max_length {max}",
                        s.chars().count()
                    )));
                }
                Ok(Value::String(s))
            }
            (FieldType::Json, Value::Json(j)) => Ok(Value::Json(j)),
            (FieldType::FloatVector { dim }, Value::Vector(v)) => {
                if v.len() != *dim {
                    return Err(self.invalid(&format!(
                        "vector dimension mismatch: expected {dim}, got {}",
                        v.len()
                    )));
                }
                Ok(Value::Vector(v))
            }
            (_, other) => Err(self.invalid(&format!(
                "expected a {:?} value, got {other:?}",
                self.field_type
            ))),
        }
    }

    fn invalid(&self, message: &str) -> OrmError {
        OrmError::Validation {
            field: self.name.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_def_new_defaults() {
        let f = FieldDef::new("title", FieldType::VarChar);
        assert_eq!(f.name, "title");
        assert!(!f.primary_key);
        assert!(!f.auto_id);
        assert!(!f.null);
        assert!(f.default.is_none());
        assert!(f.max_length.is_none());
    }

    #[test]
    fn test_field_def_builder() {
        let f = FieldDef::new("title", FieldType::VarChar)
            .max_length(200)
            .nullable()
            .description("article headline");
        assert_eq!(f.max_length, Some(200));
        assert!(f.null);
        assert_eq!(f.description, "article headline");
    }

    #[test]
    fn test_check_vector_zero_dim() {
        let f = FieldDef::new("embedding", FieldType::FloatVector { dim: 0 });
        assert!(matches!(f.check(), Err(OrmError::Schema(_))));
    }

    #[test]
    fn test_check_varchar_requires_max_length() {
        let f = FieldDef::new("title", FieldType::VarChar);
        assert!(matches!(f.check(), Err(OrmError::Schema(_))));
        let f = FieldDef::new("title", FieldType::VarChar).max_length(0);
        assert!(matches!(f.check(), Err(OrmError::Schema(_))));
        let f = FieldDef::new("title", FieldType::VarChar).max_length(200);
        assert!(f.check().is_ok());
    }

    #[test]
    fn test_check_max_length_only_on_strings() {
        let f = FieldDef::new("age", FieldType::Int64).max_length(10);
        assert!(matches!(f.check(), Err(OrmError::Schema(_))));
    }

    #[test]
    fn test_check_auto_id_requires_int_pk() {
        let f = FieldDef::new("id", FieldType::Int64).auto_id();
        assert!(matches!(f.check(), Err(OrmError::Schema(_))));
        let f = FieldDef::new("id", FieldType::VarChar)
            .max_length(36)
            .primary_key()
            .auto_id();
        assert!(matches!(f.check(), Err(OrmError::Schema(_))));
        let f = FieldDef::new("id", FieldType::Int64).primary_key().auto_id();
        assert!(f.check().is_ok());
    }

    #[test]
    fn test_validate_int() {
        let f = FieldDef::new("age", FieldType::Int64);
        assert_eq!(f.validate_value(Some(&Value::Int(7))).unwrap(), Value::Int(7));
        assert!(f.validate_value(Some(&Value::String("x".into()))).is_err());
    }

    #[test]
    fn test_validate_float_widens_int() {
        let f = FieldDef::new("score", FieldType::Double);
        assert_eq!(
            f.validate_value(Some(&Value::Int(3))).unwrap(),
            Value::Float(3.0)
        );
    }

    #[test]
    fn test_validate_string_max_length() {
        let f = FieldDef::new("title", FieldType::VarChar).max_length(5);
        assert!(f.validate_value(Some(&Value::String("short".into()))).is_ok());
        let err = f
            .validate_value(Some(&Value::String("too long".into())))
            .unwrap_err();
        match err {
            OrmError::Validation { field, .. } => assert_eq!(field, "title"),
            _ => panic!("expected Validation"),
        }
    }

    #[test]
    fn test_validate_vector_dimension_both_directions() {
        let f = FieldDef::new("embedding", FieldType::FloatVector { dim: 3 });
        assert!(f
            .validate_value(Some(&Value::Vector(vec![1.0, 2.0, 3.0])))
            .is_ok());
        // Too short and too long are both rejected, never padded or truncated.
        assert!(f.validate_value(Some(&Value::Vector(vec![1.0, 2.0]))).is_err());
        assert!(f
            .validate_value(Some(&Value::Vector(vec![1.0, 2.0, 3.0, 4.0])))
            .is_err());
    }

    #[test]
    fn test_validate_missing_resolves_default() {
        let f = FieldDef::new("active", FieldType::Bool).default(true);
        assert_eq!(f.validate_value(None).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_validate_missing_nullable() {
        let f = FieldDef::new("note", FieldType::VarChar).max_length(10).nullable();
        assert_eq!(f.validate_value(None).unwrap(), Value::Null);
    }

    #[test]
    fn test_validate_missing_required() {
        let f = FieldDef::new("age", FieldType::Int64);
        assert!(f.validate_value(None).is_err());
    }

    #[test]
    fn test_validate_missing_auto_id_pk() {
        let f = FieldDef::new("id", FieldType::Int64).primary_key().auto_id();
        assert_eq!(f.validate_value(None).unwrap(), Value::Null);
    }

    #[test]
    fn test_validate_json() {
        let f = FieldDef::new("meta", FieldType::Json);
        let j = serde_json::json!({"k": 1});
        assert_eq!(
            f.validate_value(Some(&Value::Json(j.clone()))).unwrap(),
            Value::Json(j)
        );
        assert!(f.validate_value(Some(&Value::Int(1))).is_err());
    }

    #[test]
    fn test_field_type_predicates() {
        assert!(FieldType::Float.is_float());
        assert!(FieldType::Double.is_float());
        assert!(!FieldType::Int64.is_float());
        assert!(FieldType::FloatVector { dim: 4 }.is_vector());
        assert!(!FieldType::Bool.is_vector());
    }
}
