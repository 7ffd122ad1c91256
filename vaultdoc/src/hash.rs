//! Deterministic one-way hashing for searchable fields.
//!
//! Hashed values allow equality queries without storing the plaintext. The
//! digest is an unkeyed SHA-512, so low-entropy values can be brute-forced;
//! combine with field encryption where that matters.

use crate::error::Error;
use crate::value::{canonical_float, Value};
use sha2::{Digest, Sha512};

/// Length of a hex-encoded digest.
pub const DIGEST_HEX_LEN: usize = 128;

/// Hashes a field value into a lowercase hex SHA-512 digest.
///
/// Numbers and booleans are converted to their string form first, so
/// `1` and `"1"` hash identically (as does `true`, rendered as `"1"`).
/// This lets search filters use either the raw value or its string form.
///
/// # Errors
///
/// Returns `Error::UnsupportedType` naming `field` for values without a
/// string form (null, datetimes, lists, documents, identifiers).
///
/// # Example
///
/// ```
/// use vaultdoc::hash::hash_field;
/// use vaultdoc::value::Value;
///
/// let a = hash_field("id", &Value::Int(1)).unwrap();
/// let b = hash_field("id", &Value::from("1")).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn hash_field(field: &str, value: &Value) -> Result<String, Error> {
    let text = match value {
        Value::Str(s) => return Ok(digest(s)),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => canonical_float(*x),
        Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
        other => {
            return Err(Error::UnsupportedType {
                field: field.to_string(),
                type_name: other.type_name(),
            })
        }
    };

    Ok(digest(&text))
}

fn digest(text: &str) -> String {
    hex::encode(Sha512::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_number_equals_string() {
        let from_int = hash_field("data", &Value::Int(1)).unwrap();
        let from_str = hash_field("data", &Value::from("1")).unwrap();
        let from_bool = hash_field("data", &Value::Bool(true)).unwrap();

        assert_eq!(from_int, from_str);
        assert_eq!(from_bool, from_str);
    }

    #[test]
    fn test_hash_known_vector() {
        // sha512("abc")
        let expected = "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
                        2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f";
        assert_eq!(hash_field("f", &Value::from("abc")).unwrap(), expected);
    }

    #[test]
    fn test_hash_output_format() {
        let digest = hash_field("f", &Value::Float(2.5)).unwrap();

        assert_eq!(digest.len(), DIGEST_HEX_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_hash_float_distinct_from_int() {
        let float = hash_field("f", &Value::Float(1.0)).unwrap();
        assert_eq!(float, hash_field("f", &Value::from("1.0")).unwrap());
        assert_ne!(float, hash_field("f", &Value::Int(1)).unwrap());
    }

    #[test]
    fn test_hash_false() {
        assert_eq!(
            hash_field("f", &Value::Bool(false)).unwrap(),
            hash_field("f", &Value::from("0")).unwrap()
        );
    }

    #[test]
    fn test_hash_unsupported_type_names_field() {
        let result = hash_field("tags", &Value::List(vec![]));
        match result {
            Err(Error::UnsupportedType { field, type_name }) => {
                assert_eq!(field, "tags");
                assert_eq!(type_name, "list");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(hash_field("f", &Value::Null).is_err());
    }

    proptest! {
        #[test]
        fn prop_hash_is_stable(s in ".*") {
            let value = Value::Str(s);
            prop_assert_eq!(hash_field("f", &value).unwrap(), hash_field("f", &value).unwrap());
        }

        #[test]
        fn prop_int_hash_matches_decimal_string(i in any::<i64>()) {
            prop_assert_eq!(
                hash_field("f", &Value::Int(i)).unwrap(),
                hash_field("f", &Value::Str(i.to_string())).unwrap()
            );
        }
    }
}
