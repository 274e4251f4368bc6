//! Type-safe pool name.
//!
//! [`PoolName`] is a newtype wrapper around [`String`] so that pool names
//! cannot be confused with usernames or property keys. The empty name is
//! the default (unnamed) pool.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a credential pool.
///
/// Used as the dictionary key in [`super::PoolRegistry`], as the event
/// discriminator, and as the WebSocket subscription target. Surrounding
/// whitespace is stripped, so `" a "` and `"a"` address the same pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolName(String);

impl PoolName {
    /// Creates a `PoolName` from any string-like value.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_string())
    }

    /// Returns the default (unnamed) pool.
    #[must_use]
    pub fn default_pool() -> Self {
        Self(String::new())
    }

    /// Maps an optional query value to a pool name; `None` is the default pool.
    #[must_use]
    pub fn from_optional(name: Option<&str>) -> Self {
        name.map_or_else(Self::default_pool, Self::new)
    }

    /// Returns `true` if this is the default pool.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw name (empty for the default pool).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            f.write_str("<default>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for PoolName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PoolName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
