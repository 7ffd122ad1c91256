//! Record and value types exchanged with the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name of the primary key field.
pub const ID_FIELD: &str = "_id";

/// A flat mapping of field name to value.
///
/// Nested documents and lists are opaque payloads: the codec serializes them
/// as a unit and never recurses into them.
pub type Record = BTreeMap<String, Value>;

/// Builds a [`Record`] from `key => value` pairs.
///
/// ```
/// use vaultdoc::record;
///
/// let data = record! { "_id" => 1, "value" => "value" };
/// assert_eq!(data.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::value::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::value::Record::new();
        $(
            record.insert(::std::string::String::from($key), $crate::value::Value::from($value));
        )+
        record
    }};
}

/// A field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed 64-bit integer
    Int(i64),
    /// Double precision float
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Timestamp
    DateTime(DateTime<Utc>),
    /// List of JSON-representable values
    List(Vec<serde_json::Value>),
    /// Nested document
    Document(serde_json::Map<String, serde_json::Value>),
    /// Store-native identifier
    ObjectId(ObjectId),
}

impl Value {
    /// Returns the runtime type name, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::DateTime(_) => "datetime",
            Self::List(_) => "list",
            Self::Document(_) => "dict",
            Self::ObjectId(_) => "object_id",
        }
    }

    /// Returns the string slice if this is a `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON value, mapping numbers to `Int` where they fit.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                n.as_i64().map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int)
            }
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => Self::List(items),
            serde_json::Value::Object(map) => Self::Document(map),
        }
    }

    /// Converts to a JSON value. Timestamps become RFC 3339 strings, object
    /// ids their hex form, and non-finite floats `null`.
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(b),
            Self::Int(i) => serde_json::Value::from(i),
            Self::Float(x) => serde_json::Number::from_f64(x)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Str(s) => serde_json::Value::String(s),
            Self::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Self::List(items) => serde_json::Value::Array(items),
            Self::Document(map) => serde_json::Value::Object(map),
            Self::ObjectId(id) => serde_json::Value::String(id.to_string()),
        }
    }
}

/// Renders a float the way it is hashed and tagged.
///
/// Uses the shortest round-trip digits. Decimal exponents from -4 up to 15
/// print positionally with at least one fractional digit, so `1.0` never
/// collides with the integer `1`. Anything else prints as `1e-05` or
/// `1.5e+16`, with a signed exponent of at least two digits. Non-finite
/// values print as `nan`, `inf` and `-inf`.
#[must_use]
pub fn canonical_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        let positional = value.to_string();
        if positional.contains('.') {
            positional
        } else {
            format!("{positional}.0")
        }
    } else {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!("{sign}{mantissa}e{exp_sign}{:02}", exponent.unsigned_abs())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => f.write_str(&canonical_float(*x)),
            Self::Str(s) => f.write_str(s),
            Self::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            Self::List(items) => {
                write!(f, "{}", serde_json::Value::Array(items.clone()))
            }
            Self::Document(map) => write!(f, "{}", serde_json::Value::Object(map.clone())),
            Self::ObjectId(id) => write!(f, "{id}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Self::ObjectId(value)
    }
}

impl From<Vec<serde_json::Value>> for Value {
    fn from(value: Vec<serde_json::Value>) -> Self {
        Self::List(value)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Value {
    fn from(value: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::Document(value)
    }
}

/// Size of a store-native identifier in bytes.
pub const OBJECT_ID_SIZE: usize = 12;

/// Opaque store-native identifier (12 bytes, rendered as 24 hex chars).
///
/// Identifiers are never encrypted: the codec passes them through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; OBJECT_ID_SIZE]);

impl ObjectId {
    /// Wraps raw identifier bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Generates a random identifier.
    #[must_use]
    pub fn generate() -> Self {
        use aes_gcm::aead::{rand_core::RngCore, OsRng};

        let mut bytes = [0u8; OBJECT_ID_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn bytes(&self) -> &[u8; OBJECT_ID_SIZE] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ObjectId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; OBJECT_ID_SIZE];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
