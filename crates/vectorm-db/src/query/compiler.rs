//! Predicate-tree type checking and expression rendering.
//!
//! The compiler turns a [`Q`] tree into a single string in the storage
//! layer's boolean-expression grammar. Rendering is pure and deterministic:
//! the same tree always produces the same string. Type checking against the
//! model schema is exposed separately ([`check_filter`]) so that invalid
//! operator/operand combinations surface when a predicate is attached to a
//! query chain — before any network round trip — and not at evaluation time.
//!
//! Grammar notes:
//!
//! - comparisons render as `field == literal`, `field != literal`, etc.;
//! - string matches render as `field like "%v%"` / `"v%"` / `"%v"`;
//! - membership renders as `field in [a, b, c]`;
//! - string literals are double-quoted with backslash escaping;
//! - internal nodes join children with lowercase `and` / `or`, wrapping a
//!   child in parentheses whenever it is an internal node of the opposite
//!   polarity, so precedence never depends on the grammar's associativity;
//! - negation renders as `not (child)`;
//! - the empty tree renders as the empty string, the grammar's own
//!   "no filter" convention.

use vectorm_core::{OrmError, OrmResult, Value};

use crate::fields::{FieldDef, FieldType};
use crate::model::ModelSchema;
use crate::query::lookups::{Lookup, Q};

/// Type-checks a predicate tree against a schema.
///
/// Every leaf must name a declared field, use a lookup legal for that field's
/// semantic type, and carry an operand of a matching type.
///
/// # Errors
///
/// Returns [`OrmError::Compile`] on the first violation.
pub fn check_filter(schema: &ModelSchema, q: &Q) -> OrmResult<()> {
    match q {
        Q::Filter { field, lookup } => {
            let def = schema.field(field).ok_or_else(|| {
                OrmError::Compile(format!(
                    "unknown field '{field}' on model '{}'",
                    schema.model()
                ))
            })?;
            check_lookup(def, lookup)
        }
        Q::And(children) | Q::Or(children) => {
            children.iter().try_for_each(|child| check_filter(schema, child))
        }
        Q::Not(inner) => check_filter(schema, inner),
    }
}

/// Compiles a predicate tree into the storage expression grammar.
///
/// The tree is re-checked defensively; an empty tree compiles to the empty
/// string.
///
/// # Errors
///
/// Returns [`OrmError::Compile`] if the tree cannot be rendered.
pub fn compile_filter(schema: &ModelSchema, q: &Q) -> OrmResult<String> {
    check_filter(schema, q)?;
    if q.is_empty() {
        return Ok(String::new());
    }
    render_node(schema, q)
}

/// Which internal-node kind a rendered child came from, for parenthesization.
#[derive(PartialEq, Eq, Clone, Copy)]
enum Polarity {
    And,
    Or,
    Leaf,
}

fn polarity(q: &Q) -> Polarity {
    match q {
        Q::And(_) => Polarity::And,
        Q::Or(_) => Polarity::Or,
        Q::Filter { .. } | Q::Not(_) => Polarity::Leaf,
    }
}

fn render_node(schema: &ModelSchema, q: &Q) -> OrmResult<String> {
    match q {
        Q::Filter { field, lookup } => render_leaf(field, lookup),
        Q::And(children) => render_internal(schema, children, Polarity::And),
        Q::Or(children) => render_internal(schema, children, Polarity::Or),
        Q::Not(inner) => {
            if inner.is_empty() {
                return Err(OrmError::Compile(
                    "cannot negate an empty predicate".to_string(),
                ));
            }
            Ok(format!("not ({})", render_node(schema, inner)?))
        }
    }
}

fn render_internal(schema: &ModelSchema, children: &[Q], own: Polarity) -> OrmResult<String> {
    let joiner = if own == Polarity::And { " and " } else { " or " };
    let parts: Vec<String> = children
        .iter()
        .filter(|child| !child.is_empty())
        .map(|child| {
            let rendered = render_node(schema, child)?;
            let child_polarity = polarity(child);
            // Parenthesize internal children of the opposite polarity.
            if child_polarity != Polarity::Leaf && child_polarity != own {
                Ok(format!("({rendered})"))
            } else {
                Ok(rendered)
            }
        })
        .collect::<OrmResult<_>>()?;
    Ok(parts.join(joiner))
}

fn render_leaf(field: &str, lookup: &Lookup) -> OrmResult<String> {
    let rendered = match lookup {
        Lookup::Eq(v) => format!("{field} == {}", literal(v)?),
        Lookup::Ne(v) => format!("{field} != {}", literal(v)?),
        Lookup::Gt(v) => format!("{field} > {}", literal(v)?),
        Lookup::Gte(v) => format!("{field} >= {}", literal(v)?),
        Lookup::Lt(v) => format!("{field} < {}", literal(v)?),
        Lookup::Lte(v) => format!("{field} <= {}", literal(v)?),
        Lookup::Contains(s) => format!("{field} like \"%{}%\"", escape(s)),
        Lookup::StartsWith(s) => format!("{field} like \"{}%\"", escape(s)),
        Lookup::EndsWith(s) => format!("{field} like \"%{}\"", escape(s)),
        Lookup::In(values) => {
            let items: Vec<String> = values.iter().map(literal).collect::<OrmResult<_>>()?;
            format!("{field} in [{}]", items.join(", "))
        }
        Lookup::DistanceLt(threshold) => format!("{field} < {threshold}"),
    };
    Ok(rendered)
}

/// Renders a scalar operand as a grammar literal.
pub(crate) fn literal(value: &Value) -> OrmResult<String> {
    match value {
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::String(s) => {
            let mut quoted = String::with_capacity(s.len() + 2);
            quoted.push('"');
            quoted.push_str(&escape(s));
            quoted.push('"');
            Ok(quoted)
        }
        Value::List(items) => {
            let mut out = String::from("[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&literal(item)?);
            }
            out.push(']');
            Ok(out)
        }
        Value::Null | Value::Vector(_) | Value::Json(_) => Err(OrmError::Compile(format!(
            "value {value:?} has no literal form in the expression grammar"
        ))),
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn check_lookup(field: &FieldDef, lookup: &Lookup) -> OrmResult<()> {
    let mismatch = |detail: &str| {
        Err(OrmError::Compile(format!(
            "lookup {lookup:?} is not valid for field '{}': {detail}",
            field.name
        )))
    };

    match &field.field_type {
        FieldType::Int64 => match lookup {
            Lookup::Eq(v)
            | Lookup::Ne(v)
            | Lookup::Gt(v)
            | Lookup::Gte(v)
            | Lookup::Lt(v)
            | Lookup::Lte(v) => match v {
                Value::Int(_) => Ok(()),
                _ => mismatch("operand must be an integer"),
            },
            Lookup::In(values) => {
                if values.iter().all(|v| matches!(v, Value::Int(_))) {
                    Ok(())
                } else {
                    mismatch("every member must be an integer")
                }
            }
            _ => mismatch("integer fields support comparisons and membership"),
        },
        FieldType::Float | FieldType::Double => match lookup {
            Lookup::Eq(v)
            | Lookup::Ne(v)
            | Lookup::Gt(v)
            | Lookup::Gte(v)
            | Lookup::Lt(v)
            | Lookup::Lte(v) => match v {
                Value::Int(_) | Value::Float(_) => Ok(()),
                _ => mismatch("operand must be numeric"),
            },
            Lookup::In(values) => {
                if values
                    .iter()
                    .all(|v| matches!(v, Value::Int(_) | Value::Float(_)))
                {
                    Ok(())
                } else {
                    mismatch("every member must be numeric")
                }
            }
            _ => mismatch("float fields support comparisons and membership"),
        },
        FieldType::VarChar => match lookup {
            Lookup::Eq(v)
            | Lookup::Ne(v)
            | Lookup::Gt(v)
            | Lookup::Gte(v)
            | Lookup::Lt(v)
            | Lookup::Lte(v) => match v {
                Value::String(_) => Ok(()),
                _ => mismatch("operand must be a string"),
            },
            Lookup::Contains(_) | Lookup::StartsWith(_) | Lookup::EndsWith(_) => Ok(()),
            Lookup::In(values) => {
                if values.iter().all(|v| matches!(v, Value::String(_))) {
                    Ok(())
                } else {
                    mismatch("every member must be a string")
                }
            }
            Lookup::DistanceLt(_) => mismatch("distance comparison applies to vector fields"),
        },
        FieldType::Bool => match lookup {
            Lookup::Eq(Value::Bool(_)) | Lookup::Ne(Value::Bool(_)) => Ok(()),
            Lookup::Eq(_) | Lookup::Ne(_) => mismatch("operand must be a boolean"),
            _ => mismatch("boolean fields support equality only"),
        },
        FieldType::Json => mismatch("json fields are not filterable"),
        FieldType::FloatVector { .. } => match lookup {
            Lookup::DistanceLt(_) => Ok(()),
            _ => mismatch("vector fields support distance comparison only"),
        },
    }
}
