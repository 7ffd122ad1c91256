//! In-memory store and cache backends for `VaultDoc`.
//!
//! Both backends keep everything in process memory and are suitable for
//! development and testing. Clones share state, so a test can hand one clone
//! to a facade and inspect the other.
//!
//! # Example
//!
//! ```rust,ignore
//! use vaultdoc::prelude::*;
//! use vaultdoc_memory::{MemoryCache, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let document = Document::new(store.clone(), "guilds");
//! document.insert(record! { "_id" => 1, "prefix" => "!" }).await?;
//! assert_eq!(store.len(), 1);
//! ```

#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod cache;
mod store;

pub use cache::MemoryCache;
pub use store::MemoryStore;
