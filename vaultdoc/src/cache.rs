//! Cache backend abstraction and cache key derivation.

use crate::error::CacheError;
use crate::value::{Record, Value, ID_FIELD};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// Default time-to-live for cache entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Every primary cache key starts with this prefix.
pub const PRIMARY_KEY_PREFIX: &str = "_id:";

/// A key-value cache with per-entry expiry.
///
/// An entry whose TTL has elapsed must behave exactly like an absent one.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the bytes stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backend cannot be written.
    async fn setex(&self, key: &str, ttl: Duration, value: Vec<u8>) -> Result<(), CacheError>;
}

/// Builds a cache key from field/value pairs: `field:value|` for each pair,
/// in ascending field order.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use vaultdoc::cache::lookup_key;
/// use vaultdoc::value::Value;
///
/// let value = Value::from("alaric");
/// let id = Value::Int(1);
/// let fields = BTreeMap::from([("value", &value), ("_id", &id)]);
///
/// assert_eq!(lookup_key(&fields), "_id:1|value:alaric|");
/// ```
#[must_use]
pub fn lookup_key(fields: &BTreeMap<&str, &Value>) -> String {
    fields.iter().map(|(field, value)| format!("{field}:{value}|")).collect()
}

/// Primary cache key of `record`, or `None` if it has no `_id`.
#[must_use]
pub fn primary_key(record: &Record) -> Option<String> {
    record
        .get(ID_FIELD)
        .map(|id| lookup_key(&BTreeMap::from([(ID_FIELD, id)])))
}

/// Cache key of the secondary lookup `group` in `record`, or `None` if any
/// field of the group is absent.
#[must_use]
pub fn secondary_key(record: &Record, group: &[String]) -> Option<String> {
    let fields = group
        .iter()
        .map(|field| record.get(field).map(|value| (field.as_str(), value)))
        .collect::<Option<BTreeMap<_, _>>>()?;
    Some(lookup_key(&fields))
}

/// Configuration for the cache facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    ttl: Duration,
    lookups: Vec<Vec<String>>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            lookups: Vec::new(),
        }
    }
}

impl CacheConfig {
    /// Creates a config with a one hour TTL and no secondary lookups.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL applied to every entry.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Adds a secondary lookup group, letting `get` find records by these
    /// fields as well as by `_id`.
    #[must_use]
    pub fn with_lookup<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        let mut group: Vec<String> = fields.into_iter().map(Into::into).collect();
        group.sort();
        group.dedup();
        self.lookups.push(group);
        self
    }

    /// Returns the TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the secondary lookup groups, each sorted by field name.
    #[must_use]
    pub fn lookups(&self) -> &[Vec<String>] {
        &self.lookups
    }
}
