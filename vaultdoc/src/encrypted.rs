//! Facade that encrypts and hashes fields according to a [`FieldPolicy`].
//!
//! Every write passes through the outbound [`RecordTransform`] and every read
//! through the inbound one, so callers only ever see plaintext values (and
//! digests for hashed fields).
//!
//! # Increments on encrypted fields
//!
//! A stored encrypted counter is ciphertext, not a number, so the store cannot
//! increment it natively. [`Collection::increment`] on such a field reads the
//! record, decrypts, adds, encrypts and writes the field back. This is not
//! atomic: two concurrent increments of the same encrypted counter can lose
//! one of the updates. Increments on fields that are not encrypted still use
//! the store's native increment.

use crate::codec::FieldCodec;
use crate::collection::Collection;
use crate::document::Document;
use crate::error::Error;
use crate::filter::{Filter, Projection};
use crate::key::EncryptionKey;
use crate::policy::{FieldPolicy, IgnoreFields};
use crate::store::Store;
use crate::transform::RecordTransform;
use crate::update::{increment_value, Update};
use crate::value::{Record, Value};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::Span;

/// A collection whose fields are encrypted or hashed at rest.
///
/// The policy can be changed between calls with
/// [`EncryptedDocument::update_policy`]; each operation works on the policy
/// as it was when the operation started.
///
/// # Example
///
/// ```rust,ignore
/// use vaultdoc::prelude::*;
///
/// let policy = FieldPolicy::new()
///     .with_encrypted(["email"])
///     .with_automatically_hashed(["email"]);
/// let users = EncryptedDocument::new(store, "users", EncryptedDocument::<S>::generate_key(), policy);
///
/// users.insert(record! { "_id" => 1, "email" => "alice@example.com" }).await?;
///
/// let filter = Filter::new().hashed_equals("email_hashed", "alice@example.com")?;
/// let user = users.find(&filter, None).await?;
/// ```
pub struct EncryptedDocument<S> {
    document: Document<S>,
    codec: FieldCodec,
    policy: RwLock<FieldPolicy>,
    span: Span,
}

impl<S: Store> EncryptedDocument<S> {
    /// Creates a facade over `store` for the collection `name`.
    #[must_use]
    pub fn new(store: S, name: impl Into<String>, key: EncryptionKey, policy: FieldPolicy) -> Self {
        let document = Document::new(store, name);
        let span = tracing::debug_span!("encrypted_document", collection = %document.name());
        Self {
            document,
            codec: FieldCodec::new(key),
            policy: RwLock::new(policy),
            span,
        }
    }

    /// Emits this facade's events under `span` instead of its own.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.document = self.document.with_span(span.clone());
        self.span = span;
        self
    }

    /// Generates a fresh random 256-bit key suitable for [`EncryptedDocument::new`].
    #[must_use]
    pub fn generate_key() -> EncryptionKey {
        EncryptionKey::generate()
    }

    /// Returns a snapshot of the current policy.
    #[must_use]
    pub fn policy(&self) -> FieldPolicy {
        self.policy.read().clone()
    }

    /// Modifies the policy in place.
    ///
    /// Records already stored are not rewritten; fields removed from the
    /// encrypted set will come back as raw envelopes.
    pub fn update_policy(&self, f: impl FnOnce(&mut FieldPolicy)) {
        f(&mut self.policy.write());
    }

    /// Returns the plain facade over the same store, which reads and writes
    /// stored values untouched.
    #[must_use]
    pub const fn document(&self) -> &Document<S> {
        &self.document
    }

    /// Returns the codec used for encrypted fields.
    #[must_use]
    pub const fn codec(&self) -> &FieldCodec {
        &self.codec
    }

    /// Inserts one record, leaving `ignore` fields untransformed.
    ///
    /// # Errors
    ///
    /// Returns `Error::FieldCollision`, `Error::UnsupportedType` or `Error::Store`.
    pub async fn insert_ignoring(
        &self,
        record: Record,
        ignore: &IgnoreFields,
    ) -> Result<(), Error> {
        let stored = self.to_store(record, ignore)?;
        self.document.insert(stored).await
    }

    /// Updates the first matching record, leaving `ignore` fields untransformed.
    ///
    /// # Errors
    ///
    /// Same as [`EncryptedDocument::insert_ignoring`].
    pub async fn update_ignoring(
        &self,
        filter: &Filter,
        record: Record,
        ignore: &IgnoreFields,
    ) -> Result<(), Error> {
        let stored = self.to_store(record, ignore)?;
        self.document.update(filter, stored).await
    }

    /// Upserts the first matching record, leaving `ignore` fields untransformed.
    ///
    /// # Errors
    ///
    /// Same as [`EncryptedDocument::insert_ignoring`].
    pub async fn upsert_ignoring(
        &self,
        filter: &Filter,
        record: Record,
        ignore: &IgnoreFields,
    ) -> Result<(), Error> {
        let stored = self.to_store(record, ignore)?;
        self.document.upsert(filter, stored).await
    }

    /// Inserts several records, leaving `ignore` fields untransformed.
    ///
    /// # Errors
    ///
    /// Same as [`EncryptedDocument::insert_ignoring`]; nothing is written if
    /// any record fails to transform.
    pub async fn bulk_insert_ignoring(
        &self,
        records: Vec<Record>,
        ignore: &IgnoreFields,
    ) -> Result<(), Error> {
        let stored = records
            .into_iter()
            .map(|record| self.to_store(record, ignore))
            .collect::<Result<Vec<_>, _>>()?;
        self.document.bulk_insert(stored).await
    }

    fn to_store(&self, record: Record, ignore: &IgnoreFields) -> Result<Record, Error> {
        let policy = self.policy.read();
        RecordTransform::new(&policy, &self.codec).to_store_record(record, ignore)
    }

    fn from_store(&self, record: Record) -> Result<Record, Error> {
        let policy = self.policy.read();
        RecordTransform::new(&policy, &self.codec).from_store_record(record)
    }
}

#[async_trait]
impl<S: Store> Collection for EncryptedDocument<S> {
    fn name(&self) -> &str {
        self.document.name()
    }

    async fn find(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Record>, Error> {
        self.document
            .find(filter, projection)
            .await?
            .map(|record| self.from_store(record))
            .transpose()
    }

    async fn find_many(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Record>, Error> {
        self.document
            .find_many(filter, projection)
            .await?
            .into_iter()
            .map(|record| self.from_store(record))
            .collect()
    }

    async fn insert(&self, record: Record) -> Result<(), Error> {
        self.insert_ignoring(record, &IgnoreFields::new()).await
    }

    async fn update(&self, filter: &Filter, record: Record) -> Result<(), Error> {
        self.update_ignoring(filter, record, &IgnoreFields::new()).await
    }

    async fn upsert(&self, filter: &Filter, record: Record) -> Result<(), Error> {
        self.upsert_ignoring(filter, record, &IgnoreFields::new()).await
    }

    async fn unset(&self, filter: &Filter, field: &str) -> Result<(), Error> {
        self.document.unset(filter, field).await
    }

    async fn increment(&self, filter: &Filter, field: &str, amount: Value) -> Result<(), Error> {
        let encrypted = self.policy.read().should_encrypt(field);
        if !encrypted {
            return self.document.increment(filter, field, amount).await;
        }

        if field.contains('.') {
            return Err(Error::UnsupportedOperation(format!(
                "nested field increments on encrypted field '{field}' are not supported"
            )));
        }

        let projection = Projection::show([field]);
        let current = self
            .find(filter, Some(&projection))
            .await?
            .ok_or_else(|| Error::NotFound("target of increment not found".to_string()))?;

        let mut payload = Record::new();
        payload.insert(field.to_string(), increment_value(field, current.get(field), &amount)?);
        let stored = self.to_store(payload, &IgnoreFields::new())?;

        tracing::debug!(parent: &self.span, field, "rewriting encrypted counter");
        self.document.store().update_one(filter, Update::set(stored), false).await?;
        Ok(())
    }

    async fn change_field_to(
        &self,
        filter: &Filter,
        field: &str,
        value: Value,
    ) -> Result<(), Error> {
        let mut payload = Record::new();
        payload.insert(field.to_string(), value);
        let stored = self.to_store(payload, &IgnoreFields::new())?;
        self.document.store().update_one(filter, Update::set(stored), false).await?;
        Ok(())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, Error> {
        self.document.count(filter).await
    }

    async fn delete(&self, filter: &Filter) -> Result<u64, Error> {
        self.document.delete(filter).await
    }

    async fn delete_all(&self) -> Result<(), Error> {
        self.document.delete_all().await
    }

    async fn bulk_insert(&self, records: Vec<Record>) -> Result<(), Error> {
        self.bulk_insert_ignoring(records, &IgnoreFields::new()).await
    }
}
