//! Field policy sets deciding how each field is transformed.

use std::collections::BTreeSet;
use std::fmt;

/// Suffix appended to a field name to form its shadow hash field.
pub const SHADOW_SUFFIX: &str = "_hashed";

/// Returns the shadow hash field name for `field`.
#[must_use]
pub fn shadow_field_name(field: &str) -> String {
    format!("{field}{SHADOW_SUFFIX}")
}

/// The role a policy set plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// Encrypted at rest, decrypted on read
    Encrypted,
    /// Replaced by its digest on write; never reversed
    Hashed,
    /// Gains a hidden `<field>_hashed` companion on write
    AutomaticallyHashed,
}

/// A set of field names, matched by exact string equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet(BTreeSet<String>);

/// Per-call set of fields that bypass hashing and encryption, e.g. a value
/// that is already hashed and must not be hashed again.
pub type IgnoreFields = FieldSet;

impl FieldSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns true if `field` is a member.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    /// Adds a field; returns false if it was already present.
    pub fn insert(&mut self, field: impl Into<String>) -> bool {
        self.0.insert(field.into())
    }

    /// Removes a field; returns false if it was absent.
    pub fn remove(&mut self, field: &str) -> bool {
        self.0.remove(field)
    }

    /// Iterates the members in name order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FieldSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.iter().collect();
        write!(f, "{}", fields.join(","))
    }
}

/// What happens to a field's value on its way to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    /// Replace with the encrypted envelope
    Encrypt,
    /// Replace with the digest
    Hash,
    /// Store as given
    Keep,
}

/// The three policy sets of a facade plus the encrypt-all switch.
///
/// # Example
///
/// ```
/// use vaultdoc::policy::{FieldPolicy, Outbound};
///
/// let policy = FieldPolicy::new()
///     .with_encrypted(["email"])
///     .with_hashed(["api_key"])
///     .with_automatically_hashed(["email"]);
///
/// assert_eq!(policy.outbound("email"), Outbound::Encrypt);
/// assert_eq!(policy.outbound("api_key"), Outbound::Hash);
/// assert_eq!(policy.outbound("name"), Outbound::Keep);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPolicy {
    encrypted: FieldSet,
    hashed: FieldSet,
    automatically_hashed: FieldSet,
    encrypt_all: bool,
}

impl FieldPolicy {
    /// Creates a policy that leaves every field untouched.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the encrypted fields.
    #[must_use]
    pub fn with_encrypted<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.encrypted = fields.into_iter().collect();
        self
    }

    /// Sets the hashed fields.
    #[must_use]
    pub fn with_hashed<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.hashed = fields.into_iter().collect();
        self
    }

    /// Sets the automatically hashed fields.
    #[must_use]
    pub fn with_automatically_hashed<S: Into<String>>(
        mut self,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        self.automatically_hashed = fields.into_iter().collect();
        self
    }

    /// Encrypts every field that is not ignored, regardless of the other sets.
    #[must_use]
    pub const fn with_encrypt_all(mut self, encrypt_all: bool) -> Self {
        self.encrypt_all = encrypt_all;
        self
    }

    /// Returns the set for `role`.
    #[must_use]
    pub const fn fields(&self, role: FieldRole) -> &FieldSet {
        match role {
            FieldRole::Encrypted => &self.encrypted,
            FieldRole::Hashed => &self.hashed,
            FieldRole::AutomaticallyHashed => &self.automatically_hashed,
        }
    }

    /// Returns the set for `role` for modification.
    pub fn fields_mut(&mut self, role: FieldRole) -> &mut FieldSet {
        match role {
            FieldRole::Encrypted => &mut self.encrypted,
            FieldRole::Hashed => &mut self.hashed,
            FieldRole::AutomaticallyHashed => &mut self.automatically_hashed,
        }
    }

    /// Returns true if every field is encrypted.
    #[must_use]
    pub const fn encrypt_all(&self) -> bool {
        self.encrypt_all
    }

    /// Toggles encrypt-all mode.
    pub fn set_encrypt_all(&mut self, encrypt_all: bool) {
        self.encrypt_all = encrypt_all;
    }

    /// Returns true if `field` is in the set for `role`.
    #[must_use]
    pub fn has_role(&self, field: &str, role: FieldRole) -> bool {
        self.fields(role).contains(field)
    }

    /// Single evaluation of both encryption paths.
    #[must_use]
    pub fn should_encrypt(&self, field: &str) -> bool {
        self.encrypt_all || self.encrypted.contains(field)
    }

    /// Decides the outbound transform for `field`. Encryption wins over hashing.
    #[must_use]
    pub fn outbound(&self, field: &str) -> Outbound {
        if self.should_encrypt(field) {
            Outbound::Encrypt
        } else if self.hashed.contains(field) {
            Outbound::Hash
        } else {
            Outbound::Keep
        }
    }

    /// Shadow hash field names that must never reach the caller.
    pub fn shadow_fields(&self) -> impl Iterator<Item = String> + '_ {
        self.automatically_hashed.iter().map(shadow_field_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_set_exact_match() {
        let set: FieldSet = ["user.email", "name"].into_iter().collect();

        assert!(set.contains("name"));
        assert!(set.contains("user.email"));
        assert!(!set.contains("user"));
        assert!(!set.contains("Name"));
        assert_eq!(set.to_string(), "name,user.email");
    }

    #[test]
    fn test_outbound_priority() {
        let policy = FieldPolicy::new().with_encrypted(["a"]).with_hashed(["a", "b"]);

        assert_eq!(policy.outbound("a"), Outbound::Encrypt);
        assert_eq!(policy.outbound("b"), Outbound::Hash);
        assert_eq!(policy.outbound("c"), Outbound::Keep);
    }

    #[test]
    fn test_encrypt_all_overrides_hashed() {
        let policy = FieldPolicy::new().with_hashed(["b"]).with_encrypt_all(true);

        assert!(policy.should_encrypt("anything"));
        assert_eq!(policy.outbound("b"), Outbound::Encrypt);
    }

    #[test]
    fn test_policy_mutation() {
        let mut policy = FieldPolicy::new();
        assert!(!policy.has_role("data", FieldRole::Encrypted));

        policy.fields_mut(FieldRole::Encrypted).insert("data");
        assert!(policy.has_role("data", FieldRole::Encrypted));

        policy.fields_mut(FieldRole::Encrypted).remove("data");
        assert_eq!(policy.outbound("data"), Outbound::Keep);

        policy.set_encrypt_all(true);
        assert!(policy.encrypt_all());
    }

    #[test]
    fn test_shadow_fields() {
        let policy = FieldPolicy::new().with_automatically_hashed(["guild_id", "data"]);
        let shadows: Vec<String> = policy.shadow_fields().collect();

        assert_eq!(shadows, vec!["data_hashed".to_string(), "guild_id_hashed".to_string()]);
    }
}
