//! Filters and projections passed through to the store.
//!
//! Building rich query expressions is the caller's business; this module only
//! models what the facades and the cache need to reason about: per-field
//! comparisons combined with AND, and field projections.

use crate::error::Error;
use crate::hash::hash_field;
use crate::value::{Record, Value, ID_FIELD};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A comparison applied to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Equal to
    Eq(Value),
    /// Not equal to
    Ne(Value),
    /// Greater than
    Gt(Value),
    /// Greater than or equal to
    Gte(Value),
    /// Less than
    Lt(Value),
    /// Less than or equal to
    Lte(Value),
    /// Equal to any of
    In(Vec<Value>),
    /// Field presence
    Exists(bool),
}

impl Condition {
    /// Rewrites every operand into its digest so the comparison can run
    /// against a hashed field. `Exists` has no operand and is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedType` if an operand cannot be hashed.
    pub fn hashed(self, field: &str) -> Result<Self, Error> {
        let digest = |value: Value| hash_field(field, &value).map(Value::Str);

        Ok(match self {
            Self::Eq(v) => Self::Eq(digest(v)?),
            Self::Ne(v) => Self::Ne(digest(v)?),
            Self::Gt(v) => Self::Gt(digest(v)?),
            Self::Gte(v) => Self::Gte(digest(v)?),
            Self::Lt(v) => Self::Lt(digest(v)?),
            Self::Lte(v) => Self::Lte(digest(v)?),
            Self::In(values) => Self::In(values.into_iter().map(digest).collect::<Result<_, _>>()?),
            Self::Exists(present) => Self::Exists(present),
        })
    }

    /// Evaluates the condition against a field value (`None` if absent).
    #[must_use]
    pub fn matches(&self, value: Option<&Value>) -> bool {
        let ordering = |operand: &Value| value.and_then(|v| compare(v, operand));

        match self {
            Self::Eq(operand) => value.is_some_and(|v| values_equal(v, operand)),
            Self::Ne(operand) => !value.is_some_and(|v| values_equal(v, operand)),
            Self::Gt(operand) => ordering(operand) == Some(Ordering::Greater),
            Self::Gte(operand) => {
                matches!(ordering(operand), Some(Ordering::Greater | Ordering::Equal))
            }
            Self::Lt(operand) => ordering(operand) == Some(Ordering::Less),
            Self::Lte(operand) => {
                matches!(ordering(operand), Some(Ordering::Less | Ordering::Equal))
            }
            Self::In(operands) => {
                value.is_some_and(|v| operands.iter().any(|operand| values_equal(v, operand)))
            }
            Self::Exists(present) => value.is_some() == *present,
        }
    }
}

/// Orders two values of comparable types; integers and floats compare numerically.
#[allow(clippy::cast_precision_loss)]
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
        (Value::ObjectId(x), Value::ObjectId(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare(a, b).map_or_else(|| a == b, |ordering| ordering == Ordering::Equal)
}

/// Field conditions combined with AND.
///
/// # Example
///
/// ```
/// use vaultdoc::filter::{Condition, Filter};
///
/// let filter = Filter::new()
///     .equals("guild_id", 1234)
///     .and("level", Condition::Gte(5.into()));
///
/// assert!(filter.equalities().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(BTreeMap<String, Condition>);

impl Filter {
    /// Creates a filter matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on the primary key.
    #[must_use]
    pub fn by_id(id: impl Into<Value>) -> Self {
        Self::new().equals(ID_FIELD, id)
    }

    /// Adds (or replaces) the condition for `field`.
    #[must_use]
    pub fn and(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.0.insert(field.into(), condition);
        self
    }

    /// Adds an equality condition.
    #[must_use]
    pub fn equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.and(field, Condition::Eq(value.into()))
    }

    /// Adds an equality condition against a hashed field, hashing `value` first.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedType` if `value` cannot be hashed.
    pub fn hashed_equals(
        self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, Error> {
        let field = field.into();
        let condition = Condition::Eq(value.into()).hashed(&field)?;
        Ok(self.and(field, condition))
    }

    /// Returns the condition on `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.0.get(field)
    }

    /// Iterates the conditions in field-name order.
    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.0.iter().map(|(field, condition)| (field.as_str(), condition))
    }

    /// Returns true if the filter matches every record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The flat field to value mapping, if every condition is an equality.
    #[must_use]
    pub fn equalities(&self) -> Option<BTreeMap<&str, &Value>> {
        self.0
            .iter()
            .map(|(field, condition)| match condition {
                Condition::Eq(value) => Some((field.as_str(), value)),
                _ => None,
            })
            .collect()
    }

    /// Evaluates the filter against a record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.0.iter().all(|(field, condition)| condition.matches(record.get(field)))
    }
}

impl From<Record> for Filter {
    fn from(record: Record) -> Self {
        Self(record.into_iter().map(|(field, value)| (field, Condition::Eq(value))).collect())
    }
}

impl From<&Record> for Filter {
    fn from(record: &Record) -> Self {
        Self::from(record.clone())
    }
}

/// Selects which fields a read returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Only these fields, plus `_id`
    Show(Vec<String>),
    /// Everything except these fields
    Hide(Vec<String>),
}

impl Projection {
    /// Projection returning only `fields` (and `_id`).
    #[must_use]
    pub fn show<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::Show(fields.into_iter().map(Into::into).collect())
    }

    /// Projection returning everything but `fields`.
    #[must_use]
    pub fn hide<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::Hide(fields.into_iter().map(Into::into).collect())
    }

    /// Applies the projection to a record.
    #[must_use]
    pub fn apply(&self, mut record: Record) -> Record {
        match self {
            Self::Show(fields) => {
                record.retain(|field, _| field == ID_FIELD || fields.contains(field));
                record
            }
            Self::Hide(fields) => {
                record.retain(|field, _| !fields.contains(field));
                record
            }
        }
    }
}
