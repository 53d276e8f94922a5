//! Query lookups and Q objects for building filters.
//!
//! This module provides the [`Lookup`] enum for field-level comparisons and
//! the [`Q`] enum for combining filters with AND, OR, and NOT operators. The
//! operator set is closed: it is exactly what the storage layer's boolean
//! expression grammar can express.
//!
//! # Examples
//!
//! ```
//! use vectorm_db::query::lookups::{Q, Lookup};
//! use vectorm_db::Value;
//!
//! // Simple filter: title == "Python"
//! let q = Q::filter("title", Lookup::Eq(Value::from("Python")));
//!
//! // AND: title == "Python" AND year > 2020
//! let combined = q & Q::filter("year", Lookup::Gt(Value::from(2020)));
//!
//! // OR with substring match
//! let either = Q::filter("title", Lookup::Contains("Rust".to_string()))
//!     | Q::filter("title", Lookup::Contains("Python".to_string()));
//!
//! // NOT
//! let negated = !Q::filter("archived", Lookup::Eq(Value::from(true)));
//! ```

use std::ops;

use vectorm_core::Value;

/// A field-level lookup operation.
///
/// Each variant renders to one comparison in the storage layer's expression
/// grammar. Which lookups are legal for which field types is checked when
/// the predicate is attached to a query chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Exact match (`field == value`).
    Eq(Value),
    /// Inequality (`field != value`).
    Ne(Value),
    /// Greater than (`field > value`).
    Gt(Value),
    /// Greater than or equal (`field >= value`).
    Gte(Value),
    /// Less than (`field < value`).
    Lt(Value),
    /// Less than or equal (`field <= value`).
    Lte(Value),
    /// Substring match (`field like "%value%"`).
    Contains(String),
    /// Prefix match (`field like "value%"`).
    StartsWith(String),
    /// Suffix match (`field like "%value"`).
    EndsWith(String),
    /// Membership test (`field in [values...]`).
    In(Vec<Value>),
    /// Numeric distance comparison against a vector field, for post-search
    /// distance filtering (`field < threshold`).
    DistanceLt(f64),
}

/// A composable query filter.
///
/// `Q` objects combine with `&` (AND), `|` (OR), and `!` (NOT) into a
/// predicate tree. The tree is a value: combining never mutates the operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Q {
    /// A single field lookup.
    Filter {
        /// The field name.
        field: String,
        /// The lookup operation.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions.
    And(Vec<Q>),
    /// Logical OR of multiple conditions.
    Or(Vec<Q>),
    /// Logical negation of a condition.
    Not(Box<Q>),
}

impl Q {
    /// Creates a new filter Q object.
    pub fn filter(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            field: field.into(),
            lookup,
        }
    }

    /// Returns `true` if this is an empty AND/OR (matches everything).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.is_empty(),
            _ => false,
        }
    }
}

impl ops::BitAnd for Q {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ANDs
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Q {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ORs
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Q {
    type Output = Self;

    fn not(self) -> Self::Output {
        // Double negation cancellation
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}
