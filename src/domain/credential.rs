//! Credential records and the immutable views handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutable property bag attached to a credential (e.g. `password`, `cookie`).
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Property key reserved for the identity itself.
pub const USERNAME_KEY: &str = "username";

/// Returns `true` for `.` and `..`, which URL normalization strips from a
/// path, so a credential with that username cannot be addressed by
/// `GET /credentials/{username}`.
#[must_use]
pub fn is_dot_segment(username: &str) -> bool {
    matches!(username, "." | "..")
}

/// Lease state of a single credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseState {
    /// Available to the next `lease` call.
    Free,
    /// Exclusively held by one consumer.
    Leased,
}

/// Credential as supplied at pool creation time.
///
/// Serialized flat: `{ "username": "user1", "password": "secret" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialDefinition {
    /// Identity, unique within its pool.
    pub username: String,
    /// Any extra properties.
    #[serde(flatten)]
    pub properties: Properties,
}

impl CredentialDefinition {
    /// Creates a definition with no extra properties.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            properties: Properties::new(),
        }
    }

    /// Builder-style helper adding one property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Point-in-time copy of a record returned by `lease` and `lookup`.
///
/// Has the same flat JSON shape as [`CredentialDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSnapshot {
    /// Identity of the record.
    pub username: String,
    /// Properties at the time the snapshot was taken.
    #[serde(flatten)]
    pub properties: Properties,
}

impl CredentialSnapshot {
    /// Returns a property value by key.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// Returns a property as a string slice, if it is a JSON string.
    #[must_use]
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(serde_json::Value::as_str)
    }
}

/// A single identity plus its property bag and lease state.
///
/// State only moves `Free -> Leased -> Free`; see [`CredentialRecord::try_lease`]
/// and [`CredentialRecord::release`].
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    username: String,
    properties: Properties,
    state: LeaseState,
    leased_at: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// Builds a `Free` record from a definition.
    #[must_use]
    pub fn from_definition(definition: CredentialDefinition) -> Self {
        Self {
            username: definition.username,
            properties: definition.properties,
            state: LeaseState::Free,
            leased_at: None,
        }
    }

    /// Returns the record's username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the record's properties.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Returns the current lease state.
    #[must_use]
    pub const fn state(&self) -> LeaseState {
        self.state
    }

    /// Returns `true` while the record can be leased.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.state == LeaseState::Free
    }

    /// Returns when the current lease began, if leased.
    #[must_use]
    pub const fn leased_at(&self) -> Option<DateTime<Utc>> {
        self.leased_at
    }

    /// Marks the record `Leased` if it is `Free`. Returns whether it moved.
    pub fn try_lease(&mut self) -> bool {
        if !self.is_free() {
            return false;
        }
        self.state = LeaseState::Leased;
        self.leased_at = Some(Utc::now());
        true
    }

    /// Marks the record `Free`. Returns whether it was leased before.
    pub fn release(&mut self) -> bool {
        let was_leased = self.state == LeaseState::Leased;
        self.state = LeaseState::Free;
        self.leased_at = None;
        was_leased
    }

    /// Sets `properties[key] = value`, returning the previous value.
    pub fn set_property(&mut self, key: String, value: serde_json::Value) -> Option<serde_json::Value> {
        self.properties.insert(key, value)
    }

    /// Copies the username and properties out of the record.
    #[must_use]
    pub fn snapshot(&self) -> CredentialSnapshot {
        CredentialSnapshot {
            username: self.username.clone(),
            properties: self.properties.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> CredentialRecord {
        CredentialRecord::from_definition(
            CredentialDefinition::new("user1").with_property("password", "password"),
        )
    }

    #[test]
    fn new_record_is_free() {
        let rec = record();
        assert!(rec.is_free());
        assert!(rec.leased_at().is_none());
    }

    #[test]
    fn lease_only_from_free() {
        let mut rec = record();
        assert!(rec.try_lease());
        assert_eq!(rec.state(), LeaseState::Leased);
        assert!(rec.leased_at().is_some());
        assert!(!rec.try_lease());
    }

    #[test]
    fn release_reports_previous_state() {
        let mut rec = record();
        assert!(!rec.release());
        assert!(rec.try_lease());
        assert!(rec.release());
        assert!(rec.is_free());
        assert!(rec.leased_at().is_none());
    }

    #[test]
    fn definition_deserializes_flat() {
        let def: CredentialDefinition =
            serde_json::from_value(json!({"username": "u", "password": "p", "otp": 123}))
                .unwrap_or_else(|e| panic!("bad definition: {e}"));
        assert_eq!(def.username, "u");
        assert_eq!(def.properties.get("password"), Some(&json!("p")));
        assert_eq!(def.properties.get("otp"), Some(&json!(123)));
        assert!(!def.properties.contains_key(USERNAME_KEY));
    }

    #[test]
    fn snapshot_serializes_flat() {
        let value = serde_json::to_value(record().snapshot()).unwrap_or_default();
        assert_eq!(value, json!({"username": "user1", "password": "password"}));
    }

    #[test]
    fn snapshot_is_detached_from_record() {
        let mut rec = record();
        let snap = rec.snapshot();
        let _ = rec.set_property("password".to_string(), json!("changed"));
        assert_eq!(snap.property_str("password"), Some("password"));
    }
}
