//! Field codec: typed values to authenticated ciphertext and back.
//!
//! Each call to [`FieldCodec::encode`] draws a fresh 16-byte nonce, so the
//! same value never encrypts to the same envelope twice.

use crate::envelope::{Envelope, NONCE_SIZE, TAG_SIZE};
use crate::error::Error;
use crate::key::EncryptionKey;
use crate::plaintext;
use crate::value::Value;
use aes_gcm::{
    aead::{consts::U16, rand_core::RngCore, AeadInPlace, KeyInit, OsRng},
    aes::Aes256,
    AesGcm, Nonce, Tag,
};
use std::sync::Arc;
use zeroize::Zeroizing;

/// AES-256-GCM with a 128-bit nonce.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encrypts and decrypts individual field values.
///
/// # Example
///
/// ```
/// use vaultdoc::codec::FieldCodec;
/// use vaultdoc::key::EncryptionKey;
/// use vaultdoc::value::Value;
///
/// let codec = FieldCodec::new(EncryptionKey::generate());
///
/// let stored = codec.encode("email", &Value::from("alice@example.com")).unwrap();
/// let decoded = codec.decode(&stored).unwrap();
///
/// assert_eq!(decoded, Value::from("alice@example.com"));
/// ```
pub struct FieldCodec {
    key: Arc<EncryptionKey>,
}

impl FieldCodec {
    /// Creates a codec bound to `key`.
    #[must_use]
    pub fn new(key: EncryptionKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Encrypts raw bytes into an envelope.
    ///
    /// # Errors
    ///
    /// Returns `Error::EncryptionFailed` if the cipher rejects the key or input.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Envelope, Error> {
        let cipher = Aes256Gcm16::new_from_slice(self.key.expose())
            .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&nonce_bytes), b"", &mut buffer)
            .map_err(|e| Error::EncryptionFailed(format!("AES-GCM encryption failed: {e}")))?;

        let mut tag_bytes = [0u8; TAG_SIZE];
        tag_bytes.copy_from_slice(&tag);

        Ok(Envelope::new(nonce_bytes, tag_bytes, buffer))
    }

    /// Decrypts an envelope into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthenticationFailed` if the tag does not verify, which
    /// happens with the wrong key or with data that was never encrypted.
    pub fn decrypt(&self, envelope: &Envelope) -> Result<Zeroizing<Vec<u8>>, Error> {
        let cipher = Aes256Gcm16::new_from_slice(self.key.expose())
            .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {e}")))?;

        let mut buffer = Zeroizing::new(envelope.ciphertext().to_vec());
        cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(envelope.nonce()),
                b"",
                buffer.as_mut_slice(),
                Tag::from_slice(envelope.tag()),
            )
            .map_err(|_| Error::AuthenticationFailed)?;

        Ok(buffer)
    }

    /// Encodes a field value into its stored form: a hex envelope string.
    ///
    /// Store identifiers are never encrypted and are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedType` for values outside the tag set.
    pub fn encode(&self, field: &str, value: &Value) -> Result<Value, Error> {
        if let Value::ObjectId(_) = value {
            tracing::debug!(field, "refusing to encrypt a store identifier, passing it through");
            return Ok(value.clone());
        }

        let text = plaintext::render(field, value)?;
        Ok(Value::Str(self.encrypt(text.as_bytes())?.to_hex()))
    }

    /// Decodes a stored field value.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEnvelope` if the value is not a hex envelope,
    /// `Error::AuthenticationFailed` if it does not decrypt under this key,
    /// and `Error::UnknownTypeTag` / `Error::MalformedPlaintext` if the
    /// plaintext cannot be parsed.
    pub fn decode(&self, stored: &Value) -> Result<Value, Error> {
        let hex = match stored {
            Value::ObjectId(_) => return Ok(stored.clone()),
            Value::Str(s) => s,
            other => {
                return Err(Error::InvalidEnvelope(format!(
                    "expected a hex string, found {}",
                    other.type_name()
                )))
            }
        };

        let envelope = Envelope::from_hex(hex)?;
        let bytes = self.decrypt(&envelope)?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| Error::MalformedPlaintext(format!("invalid UTF-8: {e}")))?;

        plaintext::parse(text)
    }
}

impl Clone for FieldCodec {
    fn clone(&self) -> Self {
        Self { key: Arc::clone(&self.key) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::MIN_ENVELOPE_SIZE;
    use crate::value::ObjectId;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    fn codec() -> FieldCodec {
        FieldCodec::new(EncryptionKey::generate())
    }

    #[test]
    fn test_codec_round_trip_every_tag() {
        let codec = codec();
        let values = [
            Value::from("hello"),
            Value::Int(-42),
            Value::Int(0),
            Value::Float(-3.25),
            Value::Float(10.0),
            Value::Bool(true),
            Value::Bool(false),
            Value::DateTime(Utc.with_ymd_and_hms(2022, 2, 3, 4, 5, 6).unwrap()),
            Value::List(vec![]),
            Value::List(vec![json!(1), json!([2, 3]), json!({"k": "v"})]),
            Value::Document(serde_json::Map::new()),
            Value::from_json(json!({"nested": {"list": [1, 2]}})),
        ];

        for value in values {
            let stored = codec.encode("field", &value).unwrap();
            assert_eq!(codec.decode(&stored).unwrap(), value, "round trip of {value:?}");
        }
    }

    #[test]
    fn test_codec_nonce_freshness() {
        let codec = codec();
        let value = Value::from("alice@example.com");

        let stored1 = codec.encode("email", &value).unwrap();
        let stored2 = codec.encode("email", &value).unwrap();

        assert_ne!(stored1, stored2);
        assert_eq!(codec.decode(&stored1).unwrap(), value);
        assert_eq!(codec.decode(&stored2).unwrap(), value);
    }

    #[test]
    fn test_codec_object_id_passes_through() {
        let codec = codec();
        let id = Value::ObjectId(ObjectId::generate());

        assert_eq!(codec.encode("_id", &id).unwrap(), id);
        assert_eq!(codec.decode(&id).unwrap(), id);
    }

    #[test]
    fn test_codec_rejects_null() {
        let result = codec().encode("data", &Value::Null);
        assert!(matches!(result, Err(Error::UnsupportedType { .. })));
    }

    #[test]
    fn test_codec_wrong_key_fails_authentication() {
        let stored = codec().encode("data", &Value::Int(1)).unwrap();
        let result = codec().decode(&stored);
        assert!(matches!(result, Err(Error::AuthenticationFailed)));
    }

    #[test]
    fn test_codec_plain_data_is_not_an_envelope() {
        let codec = codec();

        let result = codec.decode(&Value::from("plain text"));
        assert!(matches!(result, Err(Error::InvalidEnvelope(_))));

        let result = codec.decode(&Value::from("abcd"));
        assert!(matches!(result, Err(Error::InvalidEnvelope(_))));

        let result = codec.decode(&Value::Int(4));
        assert!(matches!(result, Err(Error::InvalidEnvelope(_))));
    }

    #[test]
    fn test_codec_corrupted_envelope_fails() {
        let codec = codec();
        let stored = codec.encode("data", &Value::from("secret")).unwrap();

        let mut bytes = hex::decode(stored.as_str().unwrap()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        let result = codec.decode(&Value::Str(hex::encode(bytes)));
        assert!(matches!(result, Err(Error::AuthenticationFailed)));
    }

    #[test]
    fn test_codec_raw_layout() {
        let codec = codec();
        let envelope = codec.encrypt(b"str     |x").unwrap();

        assert_eq!(envelope.to_bytes().len(), MIN_ENVELOPE_SIZE + 10);
        assert_eq!(&codec.decrypt(&envelope).unwrap()[..], b"str     |x");
    }

    #[test]
    fn test_codec_unknown_tag_after_decrypt() {
        let codec = codec();
        let envelope = codec.encrypt(b"set     |{1}").unwrap();

        let result = codec.decode(&Value::Str(envelope.to_hex()));
        assert!(matches!(result, Err(Error::UnknownTypeTag(_))));
    }

    #[test]
    fn test_codec_clone_shares_key() {
        let codec1 = codec();
        let codec2 = codec1.clone();

        let stored = codec1.encode("data", &Value::from("test")).unwrap();
        assert_eq!(codec2.decode(&stored).unwrap(), Value::from("test"));
    }

    proptest! {
        #[test]
        fn prop_round_trip_strings(s in ".*") {
            let codec = codec();
            let value = Value::Str(s);
            let stored = codec.encode("f", &value).unwrap();
            prop_assert_eq!(codec.decode(&stored).unwrap(), value);
        }

        #[test]
        fn prop_round_trip_ints(i in any::<i64>()) {
            let codec = codec();
            let stored = codec.encode("f", &Value::Int(i)).unwrap();
            prop_assert_eq!(codec.decode(&stored).unwrap(), Value::Int(i));
        }

        #[test]
        fn prop_round_trip_finite_floats(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
            let codec = codec();
            let stored = codec.encode("f", &Value::Float(x)).unwrap();
            prop_assert_eq!(codec.decode(&stored).unwrap(), Value::Float(x));
        }
    }
}
