//! Plain facade over a [`Store`].

use crate::collection::Collection;
use crate::error::Error;
use crate::filter::{Filter, Projection};
use crate::store::Store;
use crate::update::{Update, UpdateOperator};
use crate::value::{Record, Value, ID_FIELD};
use async_trait::async_trait;
use tracing::Span;

/// A named collection that passes records to and from the store unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use vaultdoc::prelude::*;
///
/// let document = Document::new(store, "guilds");
/// document.upsert(&Filter::by_id(1), record! { "_id" => 1, "prefix" => "!" }).await?;
/// ```
pub struct Document<S> {
    store: S,
    name: String,
    operator: UpdateOperator,
    span: Span,
}

impl<S: Store> Document<S> {
    /// Creates a facade over `store` for the collection `name`.
    #[must_use]
    pub fn new(store: S, name: impl Into<String>) -> Self {
        let name = name.into();
        let span = tracing::debug_span!("document", collection = %name);
        Self {
            store,
            name,
            operator: UpdateOperator::Set,
            span,
        }
    }

    /// Uses `operator` for [`Collection::update`] and [`Collection::upsert`]
    /// instead of `$set`.
    #[must_use]
    pub const fn update_with(mut self, operator: UpdateOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Emits this facade's events under `span` instead of its own.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the operator used by update and upsert.
    #[must_use]
    pub const fn operator(&self) -> UpdateOperator {
        self.operator
    }

    /// Returns the span this facade logs under.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    async fn write(&self, filter: &Filter, update: Update, upsert: bool) -> Result<(), Error> {
        self.store.update_one(filter, update, upsert).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: Store> Collection for Document<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Record>, Error> {
        Ok(self.store.find_one(filter, projection).await?)
    }

    async fn find_many(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Record>, Error> {
        Ok(self.store.find_many(filter, projection).await?)
    }

    async fn insert(&self, record: Record) -> Result<(), Error> {
        Ok(self.store.insert_one(record).await?)
    }

    async fn update(&self, filter: &Filter, record: Record) -> Result<(), Error> {
        self.write(filter, Update::new(self.operator, record), false).await
    }

    async fn upsert(&self, filter: &Filter, record: Record) -> Result<(), Error> {
        self.write(filter, Update::new(self.operator, record), true).await
    }

    async fn unset(&self, filter: &Filter, field: &str) -> Result<(), Error> {
        self.write(filter, Update::unset(field), false).await
    }

    async fn increment(&self, filter: &Filter, field: &str, amount: Value) -> Result<(), Error> {
        self.write(filter, Update::inc(field, amount), false).await
    }

    async fn change_field_to(
        &self,
        filter: &Filter,
        field: &str,
        value: Value,
    ) -> Result<(), Error> {
        let mut payload = Record::new();
        payload.insert(field.to_string(), value);
        self.write(filter, Update::set(payload), false).await
    }

    async fn count(&self, filter: &Filter) -> Result<u64, Error> {
        Ok(self.store.count_documents(filter).await?)
    }

    async fn delete(&self, filter: &Filter) -> Result<u64, Error> {
        Ok(self.store.delete_many(filter).await?)
    }

    async fn delete_all(&self) -> Result<(), Error> {
        let Err(e) = self.store.drop_collection().await else {
            return Ok(());
        };
        tracing::warn!(
            parent: &self.span,
            error = %e,
            "dropping collection failed, deleting records one by one"
        );

        for record in self.store.find_many(&Filter::new(), None).await? {
            let filter = record
                .get(ID_FIELD)
                .map_or_else(|| Filter::from(&record), |id| Filter::by_id(id.clone()));
            self.store.delete_many(&filter).await?;
        }
        Ok(())
    }

    async fn bulk_insert(&self, records: Vec<Record>) -> Result<(), Error> {
        Ok(self.store.insert_many(records).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::record;
    use parking_lot::Mutex;

    /// Records every update it receives and fails drops on request.
    #[derive(Default)]
    struct RecordingStore {
        updates: Mutex<Vec<(Filter, Update, bool)>>,
        records: Mutex<Vec<Record>>,
        deletes: Mutex<Vec<Filter>>,
        refuse_drop: bool,
    }

    #[async_trait]
    impl Store for RecordingStore {
        async fn find_one(
            &self,
            filter: &Filter,
            _projection: Option<&Projection>,
        ) -> Result<Option<Record>, StoreError> {
            Ok(self.records.lock().iter().find(|r| filter.matches(r)).cloned())
        }

        async fn find_many(
            &self,
            filter: &Filter,
            _projection: Option<&Projection>,
        ) -> Result<Vec<Record>, StoreError> {
            Ok(self.records.lock().iter().filter(|r| filter.matches(r)).cloned().collect())
        }

        async fn insert_one(&self, record: Record) -> Result<(), StoreError> {
            self.records.lock().push(record);
            Ok(())
        }

        async fn insert_many(&self, records: Vec<Record>) -> Result<(), StoreError> {
            self.records.lock().extend(records);
            Ok(())
        }

        async fn update_one(
            &self,
            filter: &Filter,
            update: Update,
            upsert: bool,
        ) -> Result<(), StoreError> {
            self.updates.lock().push((filter.clone(), update, upsert));
            Ok(())
        }

        async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
            self.deletes.lock().push(filter.clone());
            let mut records = self.records.lock();
            let before = records.len();
            records.retain(|r| !filter.matches(r));
            Ok((before - records.len()) as u64)
        }

        async fn count_documents(&self, filter: &Filter) -> Result<u64, StoreError> {
            Ok(self.records.lock().iter().filter(|r| filter.matches(r)).count() as u64)
        }

        async fn drop_collection(&self) -> Result<(), StoreError> {
            if self.refuse_drop {
                return Err(StoreError::Unsupported("drop".to_string()));
            }
            self.records.lock().clear();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_update_uses_configured_operator() {
        let document = Document::new(RecordingStore::default(), "test");
        document.update(&Filter::by_id(1), record! { "a" => 1 }).await.unwrap();

        let document = document.update_with(UpdateOperator::Inc);
        document.upsert(&Filter::by_id(1), record! { "a" => 1 }).await.unwrap();

        let updates = document.store().updates.lock();
        assert_eq!(updates[0].1.operator(), UpdateOperator::Set);
        assert!(!updates[0].2);
        assert_eq!(updates[1].1.operator(), UpdateOperator::Inc);
        assert!(updates[1].2);
    }

    #[tokio::test]
    async fn test_single_field_operations() {
        let document = Document::new(RecordingStore::default(), "test");

        document.unset(&Filter::by_id(1), "field_two").await.unwrap();
        document.increment(&Filter::by_id(1), "counter", Value::Int(2)).await.unwrap();
        document.change_field_to(&Filter::by_id(1), "prefix", Value::from("?")).await.unwrap();

        let updates = document.store().updates.lock();
        assert_eq!(updates[0].1, Update::unset("field_two"));
        assert_eq!(updates[1].1, Update::inc("counter", Value::Int(2)));
        assert_eq!(updates[2].1, Update::set(record! { "prefix" => "?" }));
    }

    #[tokio::test]
    async fn test_get_all_without_filter() {
        let document = Document::new(RecordingStore::default(), "test");
        document
            .bulk_insert(vec![record! { "_id" => 1 }, record! { "_id" => 2 }])
            .await
            .unwrap();

        assert_eq!(document.get_all(None, None).await.unwrap().len(), 2);
        let filter = Filter::by_id(2);
        assert_eq!(document.get_all(Some(&filter), None).await.unwrap().len(), 1);
        assert_eq!(document.count(&Filter::new()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_all_drops_collection() {
        let document = Document::new(RecordingStore::default(), "test");
        document.insert(record! { "_id" => 1 }).await.unwrap();

        document.delete_all().await.unwrap();

        assert_eq!(document.count(&Filter::new()).await.unwrap(), 0);
        assert!(document.store().deletes.lock().is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_falls_back_to_per_record_deletes() {
        let store = RecordingStore { refuse_drop: true, ..Default::default() };
        let document = Document::new(store, "test");
        document
            .bulk_insert(vec![record! { "_id" => 1 }, record! { "name" => "no id" }])
            .await
            .unwrap();

        document.delete_all().await.unwrap();

        let deletes = document.store().deletes.lock();
        assert_eq!(deletes.len(), 2);
        assert_eq!(deletes[0], Filter::by_id(1));
        assert_eq!(deletes[1], Filter::from(record! { "name" => "no id" }));
    }
}
