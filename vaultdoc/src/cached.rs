//! Read-through / write-through cache in front of a [`Collection`].
//!
//! Records are cached under their primary key `_id:<id>|`. Each configured
//! secondary lookup group gets its own entry whose value is the primary key,
//! so a `get` by those fields resolves to the same cached record.
//!
//! Cached payloads are always records as the collection returns them, so a
//! hit and a miss yield the same data.
//!
//! Entries are never invalidated. If a field in a lookup group changes, the
//! entry for its old value keeps pointing at the primary key until its TTL
//! runs out; the TTL bounds how stale a lookup can get.

use crate::cache::{
    lookup_key, primary_key, secondary_key, CacheBackend, CacheConfig, PRIMARY_KEY_PREFIX,
};
use crate::collection::Collection;
use crate::convert::{from_record, to_record};
use crate::error::Error;
use crate::filter::Filter;
use crate::value::{Record, ID_FIELD};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::Span;

/// A collection fronted by a cache backend.
///
/// # Example
///
/// ```rust,ignore
/// use vaultdoc::prelude::*;
///
/// let config = CacheConfig::new().with_lookup(["value"]);
/// let cached = CachedDocument::new(document, backend, config);
///
/// cached.set(&Filter::by_id(1), record! { "_id" => 1, "value" => "alaric" }).await?;
/// let by_value = cached.get(&Filter::new().equals("value", "alaric")).await?;
/// ```
pub struct CachedDocument<C, B> {
    collection: C,
    backend: B,
    config: CacheConfig,
    span: Span,
}

impl<C: Collection, B: CacheBackend> CachedDocument<C, B> {
    /// Creates a cache facade over `collection` backed by `backend`.
    #[must_use]
    pub fn new(collection: C, backend: B, config: CacheConfig) -> Self {
        let span = tracing::debug_span!("cached_document", collection = %collection.name());
        Self {
            collection,
            backend,
            config,
            span,
        }
    }

    /// Emits this facade's events under `span` instead of its own.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Returns the collection behind the cache.
    #[must_use]
    pub const fn collection(&self) -> &C {
        &self.collection
    }

    /// Returns the cache backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the cache configuration.
    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Fetches the record matching `filter`, from the cache if possible.
    ///
    /// Only filters made entirely of equalities can be served from the
    /// cache; anything else goes straight to the collection and is not
    /// cached. On a miss the record is read from the collection and cached
    /// under its primary key and every lookup group it has all fields for.
    ///
    /// # Errors
    ///
    /// Returns the collection's error on a miss. Cache failures are logged
    /// and treated as misses.
    pub async fn get(&self, filter: &Filter) -> Result<Option<Record>, Error> {
        let Some(equalities) = filter.equalities().filter(|fields| !fields.is_empty()) else {
            tracing::debug!(parent: &self.span, "filter is not cacheable, reading through");
            return self.collection.find(filter, None).await;
        };

        let original_key = lookup_key(&equalities);
        let mut key = original_key.clone();
        if !key.starts_with(PRIMARY_KEY_PREFIX) {
            if let Some(resolved) = self.read(&key).await {
                match String::from_utf8(resolved) {
                    Ok(resolved) => {
                        tracing::debug!(
                            parent: &self.span,
                            lookup = %key,
                            primary = %resolved,
                            "resolved secondary lookup"
                        );
                        key = resolved;
                    }
                    Err(e) => {
                        tracing::warn!(
                            parent: &self.span,
                            lookup = %key,
                            error = %e,
                            "ignoring malformed secondary lookup entry"
                        );
                    }
                }
            }
        }

        if let Some(bytes) = self.read(&key).await {
            match serde_json::from_slice::<Record>(&bytes) {
                Ok(record) => {
                    tracing::debug!(parent: &self.span, key = %original_key, "cache hit");
                    return Ok(Some(record));
                }
                Err(e) => {
                    tracing::warn!(
                        parent: &self.span,
                        key = %key,
                        error = %e,
                        "ignoring undecodable cache entry"
                    );
                }
            }
        }

        tracing::debug!(parent: &self.span, key = %original_key, "cache miss");
        let record = self.collection.find(filter, None).await?;
        if let Some(record) = &record {
            self.populate(record).await;
        }
        Ok(record)
    }

    /// Like [`CachedDocument::get`], converting the result to `T`.
    ///
    /// # Errors
    ///
    /// Same as [`CachedDocument::get`], or `Error::Conversion`.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        filter: &Filter,
    ) -> Result<Option<T>, Error> {
        self.get(filter).await?.map(from_record).transpose()
    }

    /// Upserts `record` into the collection, then refreshes its cache entries.
    ///
    /// The record is read back by `_id` after the write and that read is
    /// what gets cached, so one-way fields are cached as their digest and
    /// fields merged from an existing record are included. Records without
    /// an `_id` are written but not cached. Entries for lookup values the
    /// record no longer has are left to expire.
    ///
    /// # Errors
    ///
    /// Returns the collection's error; the cache is untouched in that case.
    /// Failures reading the record back and cache write failures are logged
    /// and swallowed.
    pub async fn set(&self, filter: &Filter, record: Record) -> Result<(), Error> {
        let id = record.get(ID_FIELD).cloned();
        self.collection.upsert(filter, record).await?;

        let Some(id) = id else {
            tracing::warn!(parent: &self.span, "record has no _id, not caching it");
            return Ok(());
        };
        match self.collection.find(&Filter::by_id(id), None).await {
            Ok(Some(stored)) => self.populate(&stored).await,
            Ok(None) => {
                tracing::warn!(parent: &self.span, "written record not found, not caching it");
            }
            Err(e) => {
                tracing::warn!(
                    parent: &self.span,
                    error = %e,
                    "reading back written record failed, not caching it"
                );
            }
        }
        Ok(())
    }

    /// Like [`CachedDocument::set`], taking a typed value.
    ///
    /// # Errors
    ///
    /// Returns `Error::Conversion` before anything is written, or the
    /// collection's error.
    pub async fn set_from<T: Serialize + Sync>(
        &self,
        filter: &Filter,
        value: &T,
    ) -> Result<(), Error> {
        self.set(filter, to_record(value)?).await
    }

    async fn read(&self, key: &str) -> Option<Vec<u8>> {
        match self.backend.get(key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    parent: &self.span,
                    key,
                    error = %e,
                    transient = e.is_transient(),
                    "cache read failed"
                );
                None
            }
        }
    }

    async fn write(&self, key: &str, value: Vec<u8>) {
        if let Err(e) = self.backend.setex(key, self.config.ttl(), value).await {
            tracing::warn!(
                parent: &self.span,
                key,
                error = %e,
                transient = e.is_transient(),
                "cache write failed"
            );
        }
    }

    async fn populate(&self, record: &Record) {
        let Some(primary) = primary_key(record) else {
            return;
        };
        let payload = match serde_json::to_vec(record) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(
                    parent: &self.span,
                    key = %primary,
                    error = %e,
                    "record cannot be cached"
                );
                return;
            }
        };

        self.write(&primary, payload).await;
        for group in self.config.lookups() {
            match secondary_key(record, group) {
                Some(key) => self.write(&key, primary.clone().into_bytes()).await,
                None => {
                    tracing::debug!(
                        parent: &self.span,
                        lookup = ?group,
                        "record lacks lookup fields, skipping"
                    );
                }
            }
        }
    }
}
