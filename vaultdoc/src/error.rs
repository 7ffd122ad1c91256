//! Error types for `VaultDoc` operations.

use std::fmt;

/// Main error type for `VaultDoc` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value's runtime type is outside the set the codec or hash supports
    #[error("cannot process field '{field}': unsupported type {type_name}")]
    UnsupportedType {
        /// Field being encoded or hashed
        field: String,
        /// Runtime type of the offending value
        type_name: &'static str,
    },

    /// The shadow hash field for an automatically hashed field already exists
    #[error("cannot automatically hash '{field}' as the field '{shadow}' already exists")]
    FieldCollision {
        /// Field that was asked to be hashed automatically
        field: String,
        /// The shadow field name that collided
        shadow: String,
    },

    /// Encryption operation failed
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// The stored value is not a well-formed ciphertext envelope
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Authentication tag verification failed (wrong key, or tampered data)
    #[error("authentication failed: ciphertext may be corrupted or encrypted with another key")]
    AuthenticationFailed,

    /// The decrypted plaintext carried a type tag outside the closed set
    #[error("unknown type tag: {0:?}")]
    UnknownTypeTag(String),

    /// The decrypted plaintext body could not be parsed for its tag
    #[error("malformed plaintext: {0}")]
    MalformedPlaintext(String),

    /// Decrypting a stored field failed authentication
    #[error("invalid encryption key in use for field '{field}'")]
    DecryptionKeyMismatch {
        /// Field that failed to decrypt
        field: String,
    },

    /// The requested operation cannot be expressed against encrypted data
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A read-modify-write target did not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Key material has the wrong size or encoding
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// JSON encoding or decoding of a list/dict body failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A typed value could not be mapped to or from a record
    #[error("conversion failed: {0}")]
    Conversion(String),

    /// The underlying store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised by a [`Store`](crate::store::Store) implementation.
#[derive(Debug)]
pub enum StoreError {
    /// The store could not be reached
    Connection(String),

    /// The store rejected the request
    Rejected(String),

    /// A record with the same `_id` already exists
    DuplicateKey(String),

    /// The operation is not available on this store
    Unsupported(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "connection failed: {msg}"),
            Self::Rejected(msg) => write!(f, "request rejected: {msg}"),
            Self::DuplicateKey(id) => write!(f, "duplicate key: {id}"),
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors raised by a [`CacheBackend`](crate::cache::CacheBackend) implementation.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache could not be reached
    #[error("connection error: {0}")]
    Connection(String),

    /// The cache backend failed to serve the request
    #[error("backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// Check if error is transient and the operation could be retried by the caller
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
