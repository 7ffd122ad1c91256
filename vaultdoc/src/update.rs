//! Update documents mirroring the store's update-operator vocabulary.

use crate::error::Error;
use crate::value::{Record, Value};

/// Update operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    /// Set fields to the payload values
    Set,
    /// Add the payload amounts to numeric fields
    Inc,
    /// Remove the payload fields
    Unset,
}

impl UpdateOperator {
    /// Returns the operator name as the store spells it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Set => "$set",
            Self::Inc => "$inc",
            Self::Unset => "$unset",
        }
    }
}

/// An operator plus its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    operator: UpdateOperator,
    payload: Record,
}

impl Update {
    /// Creates an update with an explicit operator.
    #[must_use]
    pub const fn new(operator: UpdateOperator, payload: Record) -> Self {
        Self { operator, payload }
    }

    /// `$set` the given fields.
    #[must_use]
    pub const fn set(payload: Record) -> Self {
        Self::new(UpdateOperator::Set, payload)
    }

    /// `$inc` one field by `amount`.
    #[must_use]
    pub fn inc(field: impl Into<String>, amount: Value) -> Self {
        let mut payload = Record::new();
        payload.insert(field.into(), amount);
        Self::new(UpdateOperator::Inc, payload)
    }

    /// `$unset` one field.
    #[must_use]
    pub fn unset(field: impl Into<String>) -> Self {
        let mut payload = Record::new();
        payload.insert(field.into(), Value::Bool(true));
        Self::new(UpdateOperator::Unset, payload)
    }

    /// Returns the operator.
    #[must_use]
    pub const fn operator(&self) -> UpdateOperator {
        self.operator
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &Record {
        &self.payload
    }

    /// Consumes the update, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Record {
        self.payload
    }
}

/// Adds `amount` to the current value of `field`; an absent field counts as zero.
///
/// # Errors
///
/// Returns `Error::UnsupportedType` if either side is not numeric and
/// `Error::UnsupportedOperation` on integer overflow.
#[allow(clippy::cast_precision_loss)]
pub fn increment_value(
    field: &str,
    current: Option<&Value>,
    amount: &Value,
) -> Result<Value, Error> {
    let unsupported = |value: &Value| Error::UnsupportedType {
        field: field.to_string(),
        type_name: value.type_name(),
    };

    match (current.unwrap_or(&Value::Int(0)), amount) {
        (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int).ok_or_else(|| {
            Error::UnsupportedOperation(format!("incrementing '{field}' overflows"))
        }),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::Int(_) | Value::Float(_), other) | (other, _) => Err(unsupported(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_names() {
        assert_eq!(UpdateOperator::Set.as_str(), "$set");
        assert_eq!(UpdateOperator::Inc.as_str(), "$inc");
        assert_eq!(UpdateOperator::Unset.as_str(), "$unset");
    }

    #[test]
    fn test_unset_payload() {
        let update = Update::unset("field_two");
        assert_eq!(update.operator(), UpdateOperator::Unset);
        assert_eq!(update.payload().get("field_two"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_increment_value() {
        assert_eq!(
            increment_value("c", Some(&Value::Int(4)), &Value::Int(1)).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            increment_value("c", Some(&Value::Int(4)), &Value::Int(-6)).unwrap(),
            Value::Int(-2)
        );
        assert_eq!(
            increment_value("c", Some(&Value::Float(1.5)), &Value::Int(1)).unwrap(),
            Value::Float(2.5)
        );
        assert_eq!(increment_value("c", None, &Value::Int(3)).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_increment_value_rejects_non_numbers() {
        let result = increment_value("c", Some(&Value::from("4")), &Value::Int(1));
        assert!(matches!(result, Err(Error::UnsupportedType { type_name: "str", .. })));

        let result = increment_value("c", Some(&Value::Int(4)), &Value::Bool(true));
        assert!(matches!(result, Err(Error::UnsupportedType { type_name: "bool", .. })));
    }

    #[test]
    fn test_increment_value_overflow() {
        let result = increment_value("c", Some(&Value::Int(i64::MAX)), &Value::Int(1));
        assert!(matches!(result, Err(Error::UnsupportedOperation(_))));
    }
}
