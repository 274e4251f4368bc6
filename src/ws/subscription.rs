//! Per-connection subscription manager.
//!
//! Tracks which pools a WebSocket client is subscribed to and provides
//! server-side event filtering.

use std::collections::HashSet;

use crate::domain::PoolName;

/// Wildcard entry matching every pool.
pub const WILDCARD: &str = "*";

/// Manages the set of pool subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed pools. Ignored while `subscribe_all` is set.
    pools: HashSet<PoolName>,
    /// Whether the client subscribed with `"*"`.
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds raw pool names; `"*"` enables the wildcard and `""` is the
    /// default pool. Returns the names that were added.
    pub fn subscribe(&mut self, names: &[String]) -> Vec<PoolName> {
        let mut added = Vec::with_capacity(names.len());
        for raw in names {
            if raw.trim() == WILDCARD {
                self.subscribe_all = true;
                continue;
            }
            let name = PoolName::new(raw);
            self.pools.insert(name.clone());
            added.push(name);
        }
        added
    }

    /// Removes raw pool names; `"*"` clears the wildcard.
    pub fn unsubscribe(&mut self, names: &[String]) {
        for raw in names {
            if raw.trim() == WILDCARD {
                self.subscribe_all = false;
            } else {
                self.pools.remove(&PoolName::new(raw));
            }
        }
    }

    /// Returns `true` if events of `pool` should be forwarded.
    #[must_use]
    pub fn matches(&self, pool: &PoolName) -> bool {
        self.subscribe_all || self.pools.contains(pool)
    }

    /// Returns the number of explicitly subscribed pools.
    #[must_use]
    pub fn count(&self) -> usize {
        self.pools.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&PoolName::default_pool()));
    }

    #[test]
    fn subscribe_specific_pool() {
        let mut mgr = SubscriptionManager::new();
        let added = mgr.subscribe(&names(&["staging"]));
        assert_eq!(added, vec![PoolName::new("staging")]);
        assert!(mgr.matches(&PoolName::new("staging")));
        assert!(!mgr.matches(&PoolName::new("prod")));
    }

    #[test]
    fn empty_name_is_default_pool() {
        let mut mgr = SubscriptionManager::new();
        let _ = mgr.subscribe(&names(&[""]));
        assert!(mgr.matches(&PoolName::default_pool()));
    }

    #[test]
    fn wildcard_matches_everything_until_removed() {
        let mut mgr = SubscriptionManager::new();
        let _ = mgr.subscribe(&names(&["*"]));
        assert!(mgr.is_subscribed_all());
        assert!(mgr.matches(&PoolName::new("anything")));

        mgr.unsubscribe(&names(&["*"]));
        assert!(!mgr.matches(&PoolName::new("anything")));
    }

    #[test]
    fn unsubscribe_removes_pool() {
        let mut mgr = SubscriptionManager::new();
        let _ = mgr.subscribe(&names(&["a", "b"]));
        assert_eq!(mgr.count(), 2);
        mgr.unsubscribe(&names(&["a"]));
        assert!(!mgr.matches(&PoolName::new("a")));
        assert_eq!(mgr.count(), 1);
    }
}
