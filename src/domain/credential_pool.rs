//! A named, ordered collection of credential records.
//!
//! [`CredentialPool`] is the lease state machine. It holds no lock of its
//! own: every method takes `&self` or `&mut self`, and the registry wraps
//! each pool in one exclusive lock so that the scan-and-transition in
//! [`CredentialPool::lease`] is atomic with respect to other callers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::PoolName;
use super::credential::{
    CredentialDefinition, CredentialRecord, CredentialSnapshot, USERNAME_KEY, is_dot_segment,
};
use crate::error::GatewayError;

/// Free/leased counters for a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Total number of records.
    pub size: usize,
    /// Records available for leasing.
    pub free: usize,
    /// Records currently leased.
    pub leased: usize,
}

/// Ordered credential records sharing one exclusivity domain.
#[derive(Debug)]
pub struct CredentialPool {
    name: PoolName,
    records: Vec<CredentialRecord>,
    created_at: DateTime<Utc>,
}

impl CredentialPool {
    /// Builds a pool with every record `Free`, preserving definition order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `definitions` is empty,
    /// a username is blank or a dot segment (`.`, `..`), or two definitions
    /// share a username.
    pub fn new(
        name: PoolName,
        definitions: Vec<CredentialDefinition>,
    ) -> Result<Self, GatewayError> {
        if definitions.is_empty() {
            return Err(GatewayError::InvalidRequest(format!(
                "pool {name} needs at least one credential"
            )));
        }

        let mut seen = HashSet::with_capacity(definitions.len());
        for def in &definitions {
            if def.username.trim().is_empty() {
                return Err(GatewayError::InvalidRequest(
                    "username must not be blank".to_string(),
                ));
            }
            if is_dot_segment(&def.username) {
                return Err(GatewayError::InvalidRequest(format!(
                    "username {:?} cannot be addressed in a URL path",
                    def.username
                )));
            }
            if !seen.insert(def.username.as_str()) {
                return Err(GatewayError::InvalidRequest(format!(
                    "duplicate username in pool {name}: {}",
                    def.username
                )));
            }
        }

        let records = definitions
            .into_iter()
            .map(CredentialRecord::from_definition)
            .collect();

        Ok(Self {
            name,
            records,
            created_at: Utc::now(),
        })
    }

    /// Builds a pool with no records. Used for implicit pool creation.
    #[must_use]
    pub fn empty(name: PoolName) -> Self {
        Self {
            name,
            records: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Returns the pool name.
    #[must_use]
    pub const fn name(&self) -> &PoolName {
        &self.name
    }

    /// Returns when the pool was (re)created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the pool holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &CredentialRecord> {
        self.records.iter()
    }

    /// Leases the first `Free` record in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolExhausted`] if every record is leased.
    /// Nothing is mutated in that case.
    pub fn lease(&mut self) -> Result<CredentialSnapshot, GatewayError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.is_free())
            .ok_or_else(|| GatewayError::PoolExhausted(self.name.clone()))?;
        record.try_lease();
        Ok(record.snapshot())
    }

    /// Returns the record for `username` to `Free`.
    ///
    /// Idempotent: releasing a `Free` record succeeds. Returns whether the
    /// record was leased before the call.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CredentialNotFound`] if no record has that
    /// username.
    pub fn release(&mut self, username: &str) -> Result<bool, GatewayError> {
        Ok(self.find_mut(username)?.release())
    }

    /// Sets `properties[key] = value` on the record for `username`,
    /// whatever its lease state.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `key` is blank or is the
    /// reserved `username` key, and [`GatewayError::CredentialNotFound`] if
    /// no record has that username.
    pub fn update_property(
        &mut self,
        username: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), GatewayError> {
        if key.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "property name must not be blank".to_string(),
            ));
        }
        if key == USERNAME_KEY {
            return Err(GatewayError::InvalidRequest(
                "the username property cannot be updated".to_string(),
            ));
        }
        let _ = self.find_mut(username)?.set_property(key.to_string(), value);
        Ok(())
    }

    /// Returns a snapshot of the record for `username` without leasing it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CredentialNotFound`] if no record has that
    /// username.
    pub fn lookup(&self, username: &str) -> Result<CredentialSnapshot, GatewayError> {
        self.records
            .iter()
            .find(|r| r.username() == username)
            .map(CredentialRecord::snapshot)
            .ok_or_else(|| self.not_found(username))
    }

    /// Returns free/leased counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let free = self.records.iter().filter(|r| r.is_free()).count();
        PoolStats {
            size: self.records.len(),
            free,
            leased: self.records.len() - free,
        }
    }

    fn find_mut(&mut self, username: &str) -> Result<&mut CredentialRecord, GatewayError> {
        let name = &self.name;
        self.records
            .iter_mut()
            .find(|r| r.username() == username)
            .ok_or_else(|| GatewayError::CredentialNotFound {
                pool: name.clone(),
                username: username.to_string(),
            })
    }

    fn not_found(&self, username: &str) -> GatewayError {
        GatewayError::CredentialNotFound {
            pool: self.name.clone(),
            username: username.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::credential::LeaseState;
    use serde_json::json;

    fn two_users() -> CredentialPool {
        let defs = vec![
            CredentialDefinition::new("user1").with_property("password", "password"),
            CredentialDefinition::new("user2").with_property("password", "password"),
        ];
        let Ok(pool) = CredentialPool::new(PoolName::default_pool(), defs) else {
            panic!("valid pool");
        };
        pool
    }

    #[test]
    fn empty_definition_list_is_rejected() {
        let result = CredentialPool::new(PoolName::new("a"), Vec::new());
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let defs = vec![CredentialDefinition::new("u"), CredentialDefinition::new("u")];
        let result = CredentialPool::new(PoolName::new("a"), defs);
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn blank_username_is_rejected() {
        let defs = vec![CredentialDefinition::new("  ")];
        let result = CredentialPool::new(PoolName::new("a"), defs);
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn dot_segment_usernames_are_rejected() {
        for name in [".", ".."] {
            let defs = vec![CredentialDefinition::new("user1"), CredentialDefinition::new(name)];
            let result = CredentialPool::new(PoolName::new("a"), defs);
            assert!(
                matches!(result, Err(GatewayError::InvalidRequest(_))),
                "{name:?} accepted"
            );
        }
    }

    #[test]
    fn dotted_usernames_are_accepted() {
        let defs = vec![
            CredentialDefinition::new("first.last"),
            CredentialDefinition::new("..."),
            CredentialDefinition::new("update"),
        ];
        let Ok(pool) = CredentialPool::new(PoolName::new("a"), defs) else {
            panic!("dotted usernames are addressable");
        };
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn lease_is_first_fit_then_exhausted() {
        let mut pool = two_users();

        let Ok(first) = pool.lease() else {
            panic!("first lease");
        };
        assert_eq!(first.username, "user1");
        assert_eq!(first.property_str("password"), Some("password"));

        let Ok(second) = pool.lease() else {
            panic!("second lease");
        };
        assert_eq!(second.username, "user2");

        assert!(matches!(pool.lease(), Err(GatewayError::PoolExhausted(_))));
    }

    #[test]
    fn exhausted_lease_mutates_nothing() {
        let mut pool = two_users();
        let _ = pool.lease();
        let _ = pool.lease();
        let before: Vec<_> = pool.records().map(|r| (r.state(), r.leased_at())).collect();
        assert!(pool.lease().is_err());
        let after: Vec<_> = pool.records().map(|r| (r.state(), r.leased_at())).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn release_makes_record_available_again() {
        let mut pool = two_users();
        let _ = pool.lease();
        let _ = pool.lease();

        assert!(matches!(pool.release("user1"), Ok(true)));
        let Ok(again) = pool.lease() else {
            panic!("lease after release");
        };
        assert_eq!(again.username, "user1");
    }

    #[test]
    fn release_is_idempotent() {
        let mut pool = two_users();
        let _ = pool.lease();
        assert!(matches!(pool.release("user1"), Ok(true)));
        assert!(matches!(pool.release("user1"), Ok(false)));
        let Some(rec) = pool.records().next() else {
            panic!("record");
        };
        assert_eq!(rec.state(), LeaseState::Free);
    }

    #[test]
    fn release_unknown_username_fails() {
        let mut pool = two_users();
        assert!(matches!(
            pool.release("nobody"),
            Err(GatewayError::CredentialNotFound { .. })
        ));
    }

    #[test]
    fn update_then_lookup_round_trips() {
        let mut pool = two_users();
        assert!(pool.update_property("user2", "cookie", json!("abc")).is_ok());
        let Ok(snap) = pool.lookup("user2") else {
            panic!("lookup");
        };
        assert_eq!(snap.property("cookie"), Some(&json!("abc")));
    }

    #[test]
    fn update_works_on_leased_record() {
        let mut pool = two_users();
        let _ = pool.lease();
        assert!(pool.update_property("user1", "password", json!("rotated")).is_ok());
        let Ok(snap) = pool.lookup("user1") else {
            panic!("lookup");
        };
        assert_eq!(snap.property_str("password"), Some("rotated"));
    }

    #[test]
    fn update_rejects_reserved_and_blank_keys() {
        let mut pool = two_users();
        assert!(matches!(
            pool.update_property("user1", "username", json!("x")),
            Err(GatewayError::InvalidRequest(_))
        ));
        assert!(matches!(
            pool.update_property("user1", " ", json!("x")),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn update_unknown_username_fails() {
        let mut pool = two_users();
        assert!(matches!(
            pool.update_property("ghost", "cookie", json!("abc")),
            Err(GatewayError::CredentialNotFound { .. })
        ));
    }

    #[test]
    fn lookup_does_not_lease() {
        let mut pool = two_users();
        assert!(pool.lookup("user1").is_ok());
        let Ok(snap) = pool.lease() else {
            panic!("lease");
        };
        assert_eq!(snap.username, "user1");
    }

    #[test]
    fn stats_track_leases() {
        let mut pool = two_users();
        let _ = pool.lease();
        assert_eq!(
            pool.stats(),
            PoolStats {
                size: 2,
                free: 1,
                leased: 1
            }
        );
    }

    #[test]
    fn empty_pool_is_exhausted() {
        let mut pool = CredentialPool::empty(PoolName::new("lazy"));
        assert!(pool.is_empty());
        assert!(matches!(pool.lease(), Err(GatewayError::PoolExhausted(_))));
    }
}
