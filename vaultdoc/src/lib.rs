//! # `VaultDoc`
//!
//! Field-level encryption and hashing for document stores, with a
//! read-through / write-through cache in front.
//!
//! ## Features
//!
//! - Typed field encryption (AES-256-GCM, 128-bit nonces) that round-trips
//!   strings, numbers, booleans, datetimes, lists and documents
//! - One-way SHA-512 hashing for equality search on hashed fields
//! - Automatic hidden hash companions to search encrypted fields
//! - Pluggable stores and cache backends
//! - Typed reads and writes for any `serde` type
//! - Cache lookups by `_id` or by secondary field groups, bounded by TTL
//!
//! ## Example
//!
//! ```rust,ignore
//! use vaultdoc::prelude::*;
//! use vaultdoc_memory::{MemoryCache, MemoryStore};
//!
//! let policy = FieldPolicy::new()
//!     .with_encrypted(["email"])
//!     .with_automatically_hashed(["email"]);
//! let users = EncryptedDocument::new(MemoryStore::new(), "users", EncryptionKey::generate(), policy);
//! let cached = CachedDocument::new(users, MemoryCache::new(), CacheConfig::new());
//!
//! cached.set(&Filter::by_id(1), record! { "_id" => 1, "email" => "alice@example.com" }).await?;
//! let user = cached.get(&Filter::by_id(1)).await?;
//! ```

#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod cached;
pub mod codec;
pub mod collection;
pub mod convert;
pub mod document;
pub mod encrypted;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod hash;
pub mod key;
pub mod plaintext;
pub mod policy;
pub mod store;
pub mod transform;
pub mod update;
pub mod value;

pub mod prelude {
    //! Convenience re-exports for common use.
    pub use crate::cache::{CacheBackend, CacheConfig};
    pub use crate::cached::CachedDocument;
    pub use crate::codec::FieldCodec;
    pub use crate::collection::Collection;
    pub use crate::convert::CollectionExt;
    pub use crate::document::Document;
    pub use crate::encrypted::EncryptedDocument;
    pub use crate::error::{CacheError, Error, StoreError};
    pub use crate::filter::{Condition, Filter, Projection};
    pub use crate::hash::hash_field;
    pub use crate::key::EncryptionKey;
    pub use crate::policy::{FieldPolicy, FieldRole, IgnoreFields};
    pub use crate::record;
    pub use crate::store::Store;
    pub use crate::update::{Update, UpdateOperator};
    pub use crate::value::{ObjectId, Record, Value};
}
