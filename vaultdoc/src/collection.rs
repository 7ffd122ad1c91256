//! Operation surface shared by the plain and encrypted facades.

use crate::error::Error;
use crate::filter::{Filter, Projection};
use crate::value::{Record, Value};
use async_trait::async_trait;

/// A collection as seen by application code.
///
/// [`Document`](crate::document::Document) implements it directly over a
/// [`Store`](crate::store::Store);
/// [`EncryptedDocument`](crate::encrypted::EncryptedDocument) applies its
/// field policy on the way in and out. The cache facade works against any
/// implementation.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Returns the collection name.
    fn name(&self) -> &str;

    /// Returns the first record matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` if the store fails, or a decoding error for
    /// encrypted fields.
    async fn find(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Record>, Error>;

    /// Returns every record matching `filter`.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::find`].
    async fn find_many(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Record>, Error>;

    /// Returns every record, optionally narrowed by `filter`.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::find`].
    async fn get_all(
        &self,
        filter: Option<&Filter>,
        projection: Option<&Projection>,
    ) -> Result<Vec<Record>, Error> {
        let everything = Filter::new();
        self.find_many(filter.unwrap_or(&everything), projection).await
    }

    /// Inserts one record.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` on store failure, or a transform error.
    async fn insert(&self, record: Record) -> Result<(), Error>;

    /// Updates the first record matching `filter` with `record`'s fields.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::insert`].
    async fn update(&self, filter: &Filter, record: Record) -> Result<(), Error>;

    /// Like [`Collection::update`] but inserts when nothing matches.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::insert`].
    async fn upsert(&self, filter: &Filter, record: Record) -> Result<(), Error>;

    /// Removes `field` from the first record matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` on store failure.
    async fn unset(&self, filter: &Filter, field: &str) -> Result<(), Error>;

    /// Adds `amount` to `field` on the first record matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` on store failure; encrypted facades may also
    /// return `Error::UnsupportedOperation` or `Error::NotFound`.
    async fn increment(&self, filter: &Filter, field: &str, amount: Value) -> Result<(), Error>;

    /// Sets a single field on the first record matching `filter`.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::insert`].
    async fn change_field_to(&self, filter: &Filter, field: &str, value: Value)
        -> Result<(), Error>;

    /// Counts the records matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` on store failure.
    async fn count(&self, filter: &Filter) -> Result<u64, Error>;

    /// Deletes every record matching `filter`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` on store failure.
    async fn delete(&self, filter: &Filter) -> Result<u64, Error>;

    /// Removes every record in the collection.
    ///
    /// Tries to drop the collection and falls back to deleting records one by
    /// one. Neither atomic nor guaranteed complete: records written while the
    /// fallback runs may survive it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` if the fallback fails.
    async fn delete_all(&self) -> Result<(), Error>;

    /// Inserts several records in one request.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::insert`].
    async fn bulk_insert(&self, records: Vec<Record>) -> Result<(), Error>;
}
