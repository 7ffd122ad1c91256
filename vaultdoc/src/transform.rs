//! Record transform between caller-facing and stored records.
//!
//! Outbound, each field is looked up in the policy once:
//! 1. automatically hashed fields gain a `<field>_hashed` companion holding
//!    the digest of the original value;
//! 2. encrypted fields (or every field in encrypt-all mode) become envelopes;
//! 3. otherwise hashed fields become digests.
//!
//! Ignored fields skip all of the above. Inbound, shadow fields are always
//! stripped and encrypted fields decrypted; hashed fields come back as the
//! stored digest.

use crate::codec::FieldCodec;
use crate::error::Error;
use crate::hash::hash_field;
use crate::policy::{shadow_field_name, FieldPolicy, FieldRole, IgnoreFields, Outbound};
use crate::value::{Record, Value};

/// Applies a [`FieldPolicy`] to records using a [`FieldCodec`].
pub struct RecordTransform<'a> {
    policy: &'a FieldPolicy,
    codec: &'a FieldCodec,
}

impl<'a> RecordTransform<'a> {
    /// Creates a transform over `policy` and `codec`.
    #[must_use]
    pub const fn new(policy: &'a FieldPolicy, codec: &'a FieldCodec) -> Self {
        Self { policy, codec }
    }

    /// Produces the record to send to the store.
    ///
    /// # Errors
    ///
    /// Returns `Error::FieldCollision` if a shadow hash field already exists
    /// in `record`, and `Error::UnsupportedType` if a value cannot be
    /// encrypted or hashed.
    pub fn to_store_record(&self, record: Record, ignore: &IgnoreFields) -> Result<Record, Error> {
        for field in record.keys() {
            if ignore.contains(field) || !self.policy.has_role(field, FieldRole::AutomaticallyHashed)
            {
                continue;
            }
            let shadow = shadow_field_name(field);
            if record.contains_key(&shadow) {
                return Err(Error::FieldCollision { field: field.clone(), shadow });
            }
        }

        let mut stored = Record::new();
        for (field, value) in record {
            if ignore.contains(&field) {
                stored.insert(field, value);
                continue;
            }

            if self.policy.has_role(&field, FieldRole::AutomaticallyHashed) {
                let shadow = shadow_field_name(&field);
                let digest = hash_field(&shadow, &value)?;
                stored.insert(shadow, Value::Str(digest));
            }

            let value = match self.policy.outbound(&field) {
                Outbound::Encrypt => self.codec.encode(&field, &value)?,
                Outbound::Hash => Value::Str(hash_field(&field, &value)?),
                Outbound::Keep => value,
            };
            stored.insert(field, value);
        }

        Ok(stored)
    }

    /// Produces the record to hand back to the caller.
    ///
    /// # Errors
    ///
    /// Returns `Error::DecryptionKeyMismatch` if an encrypted field fails
    /// authentication, or the codec's error if it is not an envelope at all.
    pub fn from_store_record(&self, mut record: Record) -> Result<Record, Error> {
        for shadow in self.policy.shadow_fields() {
            record.remove(&shadow);
        }

        for (field, value) in &mut record {
            if !self.policy.should_encrypt(field) {
                continue;
            }
            *value = self.codec.decode(value).map_err(|e| match e {
                Error::AuthenticationFailed => {
                    Error::DecryptionKeyMismatch { field: field.clone() }
                }
                other => other,
            })?;
        }

        Ok(record)
    }
}
