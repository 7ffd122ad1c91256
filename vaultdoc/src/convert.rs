//! Typed access to collections.
//!
//! Any `Serialize` type whose JSON form is an object can be written as a
//! record, and any `DeserializeOwned` type can be read back from one. The
//! mapping goes through `serde_json`, so typed timestamps and object ids are
//! stored as strings; build a [`Record`] by hand to keep them native.
//!
//! ```rust,ignore
//! use serde::{Deserialize, Serialize};
//! use vaultdoc::prelude::*;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Guild {
//!     _id: i64,
//!     prefix: String,
//! }
//!
//! document.insert_from(&Guild { _id: 1, prefix: "!".into() }).await?;
//! let guild: Option<Guild> = document.find_as(&Filter::by_id(1), None).await?;
//! ```

use crate::collection::Collection;
use crate::error::Error;
use crate::filter::{Filter, Projection};
use crate::value::{Record, Value};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Maps `value` to a record.
///
/// # Errors
///
/// Returns `Error::Conversion` if `value` does not serialize to a JSON
/// object, or `Error::Serialization` if serialization itself fails.
pub fn to_record<T: Serialize + ?Sized>(value: &T) -> Result<Record, Error> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => {
            Ok(map.into_iter().map(|(field, value)| (field, Value::from_json(value))).collect())
        }
        other => Err(Error::Conversion(format!(
            "expected an object, got {}",
            Value::from_json(other).type_name()
        ))),
    }
}

/// Maps `record` to `T`.
///
/// # Errors
///
/// Returns `Error::Conversion` if the record's fields do not fit `T`.
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T, Error> {
    let map = record.into_iter().map(|(field, value)| (field, value.into_json())).collect();
    serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|e| Error::Conversion(e.to_string()))
}

/// Typed variants of the [`Collection`] operations.
///
/// Implemented for every collection, so the plain and encrypted facades both
/// get it. Field policies apply to the converted record as usual.
#[async_trait]
pub trait CollectionExt: Collection {
    /// Like [`Collection::find`], converting the result to `T`.
    ///
    /// # Errors
    ///
    /// Returns the collection's error, or `Error::Conversion`.
    async fn find_as<T: DeserializeOwned + Send>(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<T>, Error> {
        self.find(filter, projection).await?.map(from_record).transpose()
    }

    /// Like [`Collection::find_many`], converting every result to `T`.
    ///
    /// # Errors
    ///
    /// Returns the collection's error, or `Error::Conversion` for the first
    /// record that does not fit.
    async fn find_many_as<T: DeserializeOwned + Send>(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<T>, Error> {
        self.find_many(filter, projection).await?.into_iter().map(from_record).collect()
    }

    /// Like [`Collection::insert`], taking a typed value.
    ///
    /// # Errors
    ///
    /// Returns `Error::Conversion` before anything is written, or the
    /// collection's error.
    async fn insert_from<T: Serialize + Sync>(&self, value: &T) -> Result<(), Error> {
        let record = to_record(value)?;
        self.insert(record).await
    }

    /// Like [`Collection::upsert`], taking a typed value.
    ///
    /// # Errors
    ///
    /// Same as [`CollectionExt::insert_from`].
    async fn upsert_from<T: Serialize + Sync>(
        &self,
        filter: &Filter,
        value: &T,
    ) -> Result<(), Error> {
        let record = to_record(value)?;
        self.upsert(filter, record).await
    }
}

impl<C: Collection + ?Sized> CollectionExt for C {}
