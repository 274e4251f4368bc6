//! Domain events reflecting lease lifecycle changes.
//!
//! Every successful mutation emits a [`PoolEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers.
//! Property values never appear in events; only their keys do.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::PoolName;

/// Domain event emitted after pool and lease state changes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PoolEvent {
    /// A pool was created or replaced.
    PoolCreated {
        /// Pool name.
        pool: PoolName,
        /// Number of records in the new pool.
        size: usize,
        /// Whether an existing pool of the same name was overwritten.
        replaced: bool,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pool was removed.
    PoolRemoved {
        /// Pool name.
        pool: PoolName,
        /// Removal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A record moved from free to leased.
    CredentialLeased {
        /// Pool name.
        pool: PoolName,
        /// Leased username.
        username: String,
        /// Free records left after the lease.
        remaining: usize,
        /// Lease timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A release call succeeded.
    CredentialReleased {
        /// Pool name.
        pool: PoolName,
        /// Released username.
        username: String,
        /// `false` when the record was already free.
        was_leased: bool,
        /// Release timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A property was set on a record.
    PropertyUpdated {
        /// Pool name.
        pool: PoolName,
        /// Target username.
        username: String,
        /// Property key (the value is never broadcast).
        property: String,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A lease attempt found no free record.
    PoolExhausted {
        /// Pool name.
        pool: PoolName,
        /// Timestamp of the failed attempt.
        timestamp: DateTime<Utc>,
    },
}

impl PoolEvent {
    /// Returns the pool this event belongs to.
    #[must_use]
    pub fn pool(&self) -> &PoolName {
        match self {
            Self::PoolCreated { pool, .. }
            | Self::PoolRemoved { pool, .. }
            | Self::CredentialLeased { pool, .. }
            | Self::CredentialReleased { pool, .. }
            | Self::PropertyUpdated { pool, .. }
            | Self::PoolExhausted { pool, .. } => pool,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PoolCreated { .. } => "pool_created",
            Self::PoolRemoved { .. } => "pool_removed",
            Self::CredentialLeased { .. } => "credential_leased",
            Self::CredentialReleased { .. } => "credential_released",
            Self::PropertyUpdated { .. } => "property_updated",
            Self::PoolExhausted { .. } => "pool_exhausted",
        }
    }
}
