//! Concurrent pool storage with per-pool locking.
//!
//! [`PoolRegistry`] stores all pools in a `HashMap` keyed by
//! [`PoolName`]. The map sits behind a [`tokio::sync::RwLock`] and each
//! pool behind its own [`tokio::sync::Mutex`], so operations on different
//! pools proceed concurrently while operations on one pool are serialized.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use super::PoolName;
use super::credential_pool::{CredentialPool, PoolStats};
use crate::error::GatewayError;

/// Shared handle to a single pool.
pub type PoolHandle = Arc<Mutex<CredentialPool>>;

/// Summary of one pool for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSummary {
    /// Pool name.
    pub name: PoolName,
    /// Free/leased counters.
    pub stats: PoolStats,
    /// When the current instance of the pool was created.
    pub created_at: DateTime<Utc>,
}

/// Central store for all credential pools.
///
/// Constructed explicitly at startup and shared through
/// [`crate::service::CredentialService`]; there is no global instance.
///
/// # Concurrency
///
/// - Installing, removing and resolving pools take the map lock briefly.
/// - A pool's lock is never held while the map lock is held for writing.
/// - Operations on the same pool are serialized by its mutex.
#[derive(Debug)]
pub struct PoolRegistry {
    pools: RwLock<HashMap<PoolName, PoolHandle>>,
    auto_create: bool,
}

impl PoolRegistry {
    /// Creates an empty registry that requires explicit pool creation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_auto_create(false)
    }

    /// Creates an empty registry. With `auto_create`, resolving an unknown
    /// name installs an empty pool instead of failing.
    #[must_use]
    pub fn with_auto_create(auto_create: bool) -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
            auto_create,
        }
    }

    /// Returns whether unknown pool names are created on first reference.
    #[must_use]
    pub const fn auto_create(&self) -> bool {
        self.auto_create
    }

    /// Installs `pool` under its name, replacing any previous pool of that
    /// name. Returns `true` if a pool was replaced.
    ///
    /// Callers holding a handle to the replaced pool keep operating on the
    /// old instance; new resolutions see the fresh one.
    pub async fn install(&self, pool: CredentialPool) -> bool {
        let name = pool.name().clone();
        let mut map = self.pools.write().await;
        map.insert(name, Arc::new(Mutex::new(pool))).is_some()
    }

    /// Returns the handle for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if no pool has that name and
    /// the registry does not auto-create pools.
    pub async fn resolve(&self, name: &PoolName) -> Result<PoolHandle, GatewayError> {
        {
            let map = self.pools.read().await;
            if let Some(handle) = map.get(name) {
                return Ok(Arc::clone(handle));
            }
        }

        if !self.auto_create {
            return Err(GatewayError::PoolNotFound(name.clone()));
        }

        // Re-check under the write lock: another caller may have created it.
        let mut map = self.pools.write().await;
        let handle = map.entry(name.clone()).or_insert_with(|| {
            tracing::info!(pool = %name, "implicitly creating empty pool");
            Arc::new(Mutex::new(CredentialPool::empty(name.clone())))
        });
        Ok(Arc::clone(handle))
    }

    /// Returns the handle for `name` without ever creating it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if no pool has that name.
    pub async fn get(&self, name: &PoolName) -> Result<PoolHandle, GatewayError> {
        let map = self.pools.read().await;
        map.get(name)
            .map(Arc::clone)
            .ok_or_else(|| GatewayError::PoolNotFound(name.clone()))
    }

    /// Removes a pool, returning its final counters.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if no pool has that name.
    pub async fn remove(&self, name: &PoolName) -> Result<PoolStats, GatewayError> {
        let handle = {
            let mut map = self.pools.write().await;
            map.remove(name)
                .ok_or_else(|| GatewayError::PoolNotFound(name.clone()))?
        };
        let pool = handle.lock().await;
        Ok(pool.stats())
    }

    /// Returns summaries of all pools sorted by name.
    pub async fn list(&self) -> Vec<PoolSummary> {
        let handles: Vec<(PoolName, PoolHandle)> = {
            let map = self.pools.read().await;
            map.iter()
                .map(|(name, handle)| (name.clone(), Arc::clone(handle)))
                .collect()
        };

        let mut summaries = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let pool = handle.lock().await;
            summaries.push(PoolSummary {
                name,
                stats: pool.stats(),
                created_at: pool.created_at(),
            });
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Returns the number of pools in the registry.
    pub async fn len(&self) -> usize {
        self.pools.read().await.len()
    }

    /// Returns `true` if the registry contains no pools.
    pub async fn is_empty(&self) -> bool {
        self.pools.read().await.is_empty()
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
