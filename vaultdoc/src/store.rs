//! Store abstraction for the document database behind the facades.

use crate::error::StoreError;
use crate::filter::{Filter, Projection};
use crate::update::Update;
use crate::value::Record;
use async_trait::async_trait;

/// A single collection in a document store.
///
/// The facades only ever talk to the store through this trait. Implementations
/// must be thread-safe (`Send + Sync`) since a facade may issue many
/// concurrent operations against the same collection.
///
/// # Example
///
/// ```rust,ignore
/// use vaultdoc::store::Store;
///
/// struct MyStore;
///
/// #[async_trait]
/// impl Store for MyStore {
///     async fn find_one(&self, filter: &Filter, projection: Option<&Projection>)
///         -> Result<Option<Record>, StoreError> {
///         // Implementation
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the first record matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    async fn find_one(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Record>, StoreError>;

    /// Returns every record matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    async fn find_many(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Record>, StoreError>;

    /// Inserts one record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if a record with the same `_id` exists.
    async fn insert_one(&self, record: Record) -> Result<(), StoreError>;

    /// Inserts several records.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if any `_id` collides.
    async fn insert_many(&self, records: Vec<Record>) -> Result<(), StoreError>;

    /// Applies `update` to the first record matching `filter`, inserting one
    /// built from the filter's equalities when nothing matches and `upsert`
    /// is set.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Rejected` if the update cannot be applied.
    async fn update_one(
        &self,
        filter: &Filter,
        update: Update,
        upsert: bool,
    ) -> Result<(), StoreError>;

    /// Deletes every record matching `filter` and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the deletion fails.
    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Counts the records matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the count fails.
    async fn count_documents(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Drops the whole collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unsupported` if the store cannot drop collections.
    async fn drop_collection(&self) -> Result<(), StoreError>;
}
