//! Tagged plaintext format.
//!
//! Before encryption a value is rendered as `<tag:8>|<body>`, e.g.
//! `"str     |hello"`. The tag set is closed; anything else is rejected.

use crate::error::Error;
use crate::value::{canonical_float, Value};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Width of the tag prefix including the `|` separator.
pub const TAG_WIDTH: usize = 9;

/// Closed set of type tags a plaintext can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    /// UTF-8 string
    Str,
    /// Integer
    Int,
    /// Float
    Float,
    /// Boolean
    Bool,
    /// ISO-8601 timestamp
    DateTime,
    /// List of JSON values
    List,
    /// JSON object
    Dict,
}

impl TypeTag {
    /// Returns the tag name as written into the plaintext.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::DateTime => "datetime",
            Self::List => "list",
            Self::Dict => "dict",
        }
    }

    /// Parses a tag name.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownTypeTag` for anything outside the closed set.
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "str" => Ok(Self::Str),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "bool" => Ok(Self::Bool),
            "datetime" => Ok(Self::DateTime),
            "list" => Ok(Self::List),
            "dict" => Ok(Self::Dict),
            other => Err(Error::UnknownTypeTag(other.to_string())),
        }
    }
}

/// Lists are wrapped in an object so the body is always a JSON object.
#[derive(Serialize, Deserialize)]
struct ListBody {
    list: Vec<serde_json::Value>,
}

/// Renders `value` as tagged plaintext.
///
/// # Errors
///
/// Returns `Error::UnsupportedType` for values outside the tag set
/// (including store identifiers, which callers must pass through themselves).
pub fn render(field: &str, value: &Value) -> Result<Zeroizing<String>, Error> {
    let (tag, body) = match value {
        Value::Str(s) => (TypeTag::Str, s.clone()),
        Value::Int(i) => (TypeTag::Int, i.to_string()),
        Value::Float(x) => (TypeTag::Float, canonical_float(*x)),
        Value::Bool(b) => (TypeTag::Bool, String::from(if *b { "1" } else { "0" })),
        Value::DateTime(dt) => (TypeTag::DateTime, dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::List(items) => {
            let json = serde_json::to_vec(&ListBody { list: items.clone() })?;
            (TypeTag::List, hex::encode(json))
        }
        Value::Document(map) => (TypeTag::Dict, hex::encode(serde_json::to_vec(map)?)),
        Value::Null | Value::ObjectId(_) => {
            return Err(Error::UnsupportedType {
                field: field.to_string(),
                type_name: value.type_name(),
            })
        }
    };

    let body = Zeroizing::new(body);
    Ok(Zeroizing::new(format!("{:<8}|{}", tag.as_str(), body.as_str())))
}

/// Parses tagged plaintext back into a value.
///
/// # Errors
///
/// Returns `Error::UnknownTypeTag` for an unrecognized tag and
/// `Error::MalformedPlaintext` if the body does not parse for its tag.
pub fn parse(text: &str) -> Result<Value, Error> {
    if text.len() < TAG_WIDTH || !text.is_char_boundary(TAG_WIDTH) {
        return Err(Error::MalformedPlaintext("missing type tag".to_string()));
    }

    let (head, body) = text.split_at(TAG_WIDTH);
    let name = head.split('|').next().unwrap_or_default().trim();

    match TypeTag::parse(name)? {
        TypeTag::Str => Ok(Value::Str(body.to_string())),
        TypeTag::Int => body
            .parse()
            .map(Value::Int)
            .map_err(|e| Error::MalformedPlaintext(format!("invalid int: {e}"))),
        TypeTag::Float => body
            .parse()
            .map(Value::Float)
            .map_err(|e| Error::MalformedPlaintext(format!("invalid float: {e}"))),
        TypeTag::Bool => match body {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(Error::MalformedPlaintext(format!("invalid bool: {other:?}"))),
        },
        TypeTag::DateTime => parse_datetime(body).map(Value::DateTime),
        TypeTag::List => {
            let inner: ListBody = serde_json::from_slice(&decode_hex(body)?)
                .map_err(|e| Error::MalformedPlaintext(format!("invalid list: {e}")))?;
            Ok(Value::List(inner.list))
        }
        TypeTag::Dict => serde_json::from_slice(&decode_hex(body)?)
            .map(Value::Document)
            .map_err(|e| Error::MalformedPlaintext(format!("invalid dict: {e}"))),
    }
}

fn decode_hex(body: &str) -> Result<Zeroizing<Vec<u8>>, Error> {
    hex::decode(body)
        .map(Zeroizing::new)
        .map_err(|e| Error::MalformedPlaintext(format!("invalid hex body: {e}")))
}

// Naive timestamps (no offset) are read as UTC.
fn parse_datetime(body: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(body) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| Error::MalformedPlaintext(format!("invalid datetime: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_pads_tag() {
        assert_eq!(render("f", &Value::from("hello")).unwrap().as_str(), "str     |hello");
        assert_eq!(render("f", &Value::Int(-4)).unwrap().as_str(), "int     |-4");
        assert_eq!(render("f", &Value::Bool(true)).unwrap().as_str(), "bool    |1");
        assert_eq!(render("f", &Value::Float(2.0)).unwrap().as_str(), "float   |2.0");

        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(
            render("f", &Value::DateTime(dt)).unwrap().as_str(),
            "datetime|2024-05-01T12:30:00Z"
        );
    }

    #[test]
    fn test_render_list_body_is_wrapped_json() {
        let rendered = render("f", &Value::List(vec![json!(1), json!("a")])).unwrap();
        let body = rendered.strip_prefix("list    |").unwrap();
        let json: serde_json::Value = serde_json::from_slice(&hex::decode(body).unwrap()).unwrap();

        assert_eq!(json, json!({"list": [1, "a"]}));
    }

    #[test]
    fn test_render_rejects_unsupported() {
        let result = render("owner", &Value::Null);
        assert!(matches!(
            result,
            Err(Error::UnsupportedType { ref field, type_name: "null" }) if field == "owner"
        ));

        let result = render("_id", &Value::ObjectId(crate::value::ObjectId::generate()));
        assert!(matches!(result, Err(Error::UnsupportedType { .. })));
    }

    #[test]
    fn test_parse_round_trip() {
        let values = [
            Value::from("hello"),
            Value::from(""),
            Value::Int(-12),
            Value::Float(-0.5),
            Value::Bool(false),
            Value::List(vec![]),
            Value::List(vec![json!({"nested": [1, 2, {"deep": null}]})]),
            Value::Document(serde_json::Map::new()),
            Value::from_json(json!({"a": {"b": [true, 1.5]}})),
        ];

        for value in values {
            let rendered = render("f", &value).unwrap();
            assert_eq!(parse(&rendered).unwrap(), value);
        }
    }

    #[test]
    fn test_parse_string_with_pipes() {
        let value = Value::from("a|b|c");
        assert_eq!(parse(&render("f", &value).unwrap()).unwrap(), value);
    }

    #[test]
    fn test_parse_naive_datetime() {
        let value = parse("datetime|2023-01-02T03:04:05.123456").unwrap();
        let expected = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(value, Value::DateTime(expected));
    }

    #[test]
    fn test_parse_unknown_tag() {
        let result = parse("tuple   |(1,2)");
        assert!(matches!(result, Err(Error::UnknownTypeTag(ref tag)) if tag == "tuple"));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(parse("int"), Err(Error::MalformedPlaintext(_))));
        assert!(matches!(parse("int     |abc"), Err(Error::MalformedPlaintext(_))));
        assert!(matches!(parse("list    |zz"), Err(Error::MalformedPlaintext(_))));
    }
}
