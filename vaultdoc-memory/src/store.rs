//! In-memory implementation of the store contract.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use vaultdoc::error::StoreError;
use vaultdoc::filter::{Filter, Projection};
use vaultdoc::store::Store;
use vaultdoc::update::{increment_value, Update, UpdateOperator};
use vaultdoc::value::{ObjectId, Record, Value, ID_FIELD};

/// A single collection held in memory, in insertion order.
///
/// Records inserted without an `_id` get a generated [`ObjectId`], and `_id`
/// values are unique within the collection.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<Record>>>,
    drop_disabled: bool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes [`Store::drop_collection`] fail, as it does for users without
    /// the privilege to drop collections.
    #[must_use]
    pub const fn with_drop_disabled(mut self) -> Self {
        self.drop_disabled = true;
        self
    }

    /// Returns a copy of every stored record, exactly as stored.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.records.read().clone()
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn check_unique(records: &[Record], record: &Record) -> Result<(), StoreError> {
        match record.get(ID_FIELD) {
            Some(id) if records.iter().any(|r| r.get(ID_FIELD) == Some(id)) => {
                Err(StoreError::DuplicateKey(id.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn with_id(mut record: Record) -> Record {
        record
            .entry(ID_FIELD.to_string())
            .or_insert_with(|| Value::ObjectId(ObjectId::generate()));
        record
    }
}

fn apply(record: &mut Record, update: Update) -> Result<(), StoreError> {
    let operator = update.operator();
    for (field, value) in update.into_payload() {
        match operator {
            UpdateOperator::Set => {
                record.insert(field, value);
            }
            UpdateOperator::Unset => {
                record.remove(&field);
            }
            UpdateOperator::Inc => {
                let incremented = increment_value(&field, record.get(&field), &value)
                    .map_err(|e| StoreError::Rejected(e.to_string()))?;
                record.insert(field, incremented);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_one(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Record>, StoreError> {
        let records = self.records.read();
        Ok(records
            .iter()
            .find(|r| filter.matches(r))
            .map(|r| projection.map_or_else(|| r.clone(), |p| p.apply(r.clone()))))
    }

    async fn find_many(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Record>, StoreError> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| projection.map_or_else(|| r.clone(), |p| p.apply(r.clone())))
            .collect())
    }

    async fn insert_one(&self, record: Record) -> Result<(), StoreError> {
        let record = Self::with_id(record);
        let mut records = self.records.write();
        Self::check_unique(&records, &record)?;
        records.push(record);
        Ok(())
    }

    async fn insert_many(&self, batch: Vec<Record>) -> Result<(), StoreError> {
        let batch: Vec<Record> = batch.into_iter().map(Self::with_id).collect();
        let mut records = self.records.write();
        for (i, record) in batch.iter().enumerate() {
            Self::check_unique(&records, record)?;
            Self::check_unique(&batch[..i], record)?;
        }
        records.extend(batch);
        Ok(())
    }

    async fn update_one(
        &self,
        filter: &Filter,
        update: Update,
        upsert: bool,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if let Some(record) = records.iter_mut().find(|r| filter.matches(r)) {
            let mut updated = record.clone();
            apply(&mut updated, update)?;
            *record = updated;
            return Ok(());
        }

        if !upsert {
            tracing::debug!(operator = update.operator().as_str(), "update matched nothing");
            return Ok(());
        }

        let mut record: Record = filter
            .equalities()
            .unwrap_or_default()
            .into_iter()
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect();
        apply(&mut record, update)?;
        let record = Self::with_id(record);
        Self::check_unique(&records, &record)?;
        records.push(record);
        Ok(())
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| !filter.matches(r));
        Ok((before - records.len()) as u64)
    }

    async fn count_documents(&self, filter: &Filter) -> Result<u64, StoreError> {
        let records = self.records.read();
        Ok(records.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn drop_collection(&self) -> Result<(), StoreError> {
        if self.drop_disabled {
            return Err(StoreError::Unsupported("dropping collections is disabled".to_string()));
        }
        self.records.write().clear();
        Ok(())
    }
}
