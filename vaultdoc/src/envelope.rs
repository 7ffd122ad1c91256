//! Ciphertext envelope format for stored field values.
//!
//! Format:
//! ```text
//! [nonce:16][tag:16][ciphertext:N]
//! ```
//!
//! The envelope is hex-encoded before it is handed to the store, which treats
//! it as an opaque string.

use crate::error::Error;

/// Nonce size in bytes.
pub const NONCE_SIZE: usize = 16;

/// Authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Minimum length of a serialized envelope (empty ciphertext).
pub const MIN_ENVELOPE_SIZE: usize = NONCE_SIZE + TAG_SIZE;

/// One encrypted field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    nonce: [u8; NONCE_SIZE],
    tag: [u8; TAG_SIZE],
    ciphertext: Vec<u8>,
}

impl Envelope {
    /// Creates a new envelope.
    #[must_use]
    pub const fn new(nonce: [u8; NONCE_SIZE], tag: [u8; TAG_SIZE], ciphertext: Vec<u8>) -> Self {
        Self { nonce, tag, ciphertext }
    }

    /// Returns the nonce.
    #[must_use]
    pub const fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    /// Returns the authentication tag.
    #[must_use]
    pub const fn tag(&self) -> &[u8; TAG_SIZE] {
        &self.tag
    }

    /// Returns the ciphertext.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Serializes the envelope to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(MIN_ENVELOPE_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.tag);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Deserializes an envelope from bytes.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEnvelope` if the data is shorter than
    /// nonce plus tag.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() < MIN_ENVELOPE_SIZE {
            return Err(Error::InvalidEnvelope(format!(
                "envelope too short: {} bytes (min: {MIN_ENVELOPE_SIZE})",
                data.len()
            )));
        }

        let (nonce, rest) = data.split_at(NONCE_SIZE);
        let (tag, ciphertext) = rest.split_at(TAG_SIZE);

        let mut envelope =
            Self { nonce: [0u8; NONCE_SIZE], tag: [0u8; TAG_SIZE], ciphertext: ciphertext.to_vec() };
        envelope.nonce.copy_from_slice(nonce);
        envelope.tag.copy_from_slice(tag);

        Ok(envelope)
    }

    /// Hex-encodes the envelope for storage.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parses a hex-encoded envelope.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEnvelope` if the input is not hex or is too short.
    pub fn from_hex(data: &str) -> Result<Self, Error> {
        let bytes =
            hex::decode(data).map_err(|e| Error::InvalidEnvelope(format!("not hex: {e}")))?;
        Self::from_bytes(&bytes)
    }
}
