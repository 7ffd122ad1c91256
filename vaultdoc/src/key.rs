//! Encryption key handling.
//!
//! The key is supplied by the caller at facade construction time; it is
//! neither owned nor persisted by this crate.

use crate::error::Error;
use secrecy::{ExposeSecret, SecretVec};
use std::fmt;

/// Key size in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// A 256-bit secret used for authenticated field encryption.
///
/// # Example
///
/// ```
/// use vaultdoc::key::EncryptionKey;
///
/// let key = EncryptionKey::generate();
/// let restored = EncryptionKey::from_hex(&key.to_hex()).expect("valid key");
/// assert_eq!(key.to_hex(), restored.to_hex());
/// ```
pub struct EncryptionKey(SecretVec<u8>);

impl EncryptionKey {
    /// Generates a fresh key from the operating system's secure RNG.
    ///
    /// Store the output somewhere safe (e.g. an environment variable via
    /// [`to_hex`](Self::to_hex)), otherwise the encrypted data is lost.
    #[must_use]
    pub fn generate() -> Self {
        use aes_gcm::aead::{rand_core::RngCore, OsRng};

        let mut key = vec![0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self(SecretVec::new(key))
    }

    /// Wraps existing key material.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` unless exactly 32 bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != KEY_SIZE {
            return Err(Error::InvalidKey(format!(
                "expected {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(SecretVec::new(bytes.to_vec())))
    }

    /// Parses a hex-encoded key.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` if the input is not hex or has the wrong length.
    pub fn from_hex(data: &str) -> Result<Self, Error> {
        let bytes = zeroize::Zeroizing::new(
            hex::decode(data.trim()).map_err(|e| Error::InvalidKey(format!("not hex: {e}")))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Hex-encodes the key for storage outside the process.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.expose_secret())
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncryptionKey").field(&"[REDACTED]").finish()
    }
}

impl Clone for EncryptionKey {
    fn clone(&self) -> Self {
        Self(SecretVec::new(self.0.expose_secret().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key() {
        let key1 = EncryptionKey::generate();
        let key2 = EncryptionKey::generate();

        // Generated keys should be different
        assert_ne!(key1.expose(), key2.expose());

        assert_eq!(key1.expose().len(), KEY_SIZE);
        assert_eq!(key2.expose().len(), KEY_SIZE);
    }

    #[test]
    fn test_key_hex_round_trip() {
        let key = EncryptionKey::generate();
        let hex = key.to_hex();

        assert_eq!(hex.len(), KEY_SIZE * 2);
        assert_eq!(EncryptionKey::from_hex(&hex).unwrap().expose(), key.expose());
    }

    #[test]
    fn test_key_wrong_length() {
        let result = EncryptionKey::from_bytes(&[0u8; 16]);
        assert!(matches!(result, Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_key_not_hex() {
        let result = EncryptionKey::from_hex("zz");
        assert!(matches!(result, Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let key = EncryptionKey::from_bytes(&[0x41; KEY_SIZE]).unwrap();
        let debug = format!("{key:?}");
        assert_eq!(debug, r#"EncryptionKey("[REDACTED]")"#);
        assert!(!debug.contains(&"41".repeat(4)));
        assert!(!debug.contains("65, 65"));
    }
}
