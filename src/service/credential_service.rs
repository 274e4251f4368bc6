//! Credential service: orchestrates pool operations and emits events.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    CredentialDefinition, CredentialPool, CredentialSnapshot, EventBus, PoolEvent, PoolName,
    PoolRegistry, PoolStats, PoolSummary,
};
use crate::error::GatewayError;

/// Orchestration layer for all credential operations.
///
/// Stateless coordinator: owns references to [`PoolRegistry`] for state
/// and [`EventBus`] for event emission. Every mutation follows the pattern:
/// resolve pool → lock → mutate → unlock → emit event → return result.
/// Failures are returned as-is; nothing is retried here.
#[derive(Debug, Clone)]
pub struct CredentialService {
    registry: Arc<PoolRegistry>,
    event_bus: EventBus,
}

impl CredentialService {
    /// Creates a new `CredentialService`.
    #[must_use]
    pub fn new(registry: Arc<PoolRegistry>, event_bus: EventBus) -> Self {
        Self {
            registry,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`PoolRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    /// Creates (or fully replaces) the pool `name` from `definitions`.
    ///
    /// Returns the number of records in the new pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `definitions` is empty
    /// or contains blank or duplicate usernames.
    pub async fn create_pool(
        &self,
        name: PoolName,
        definitions: Vec<CredentialDefinition>,
    ) -> Result<usize, GatewayError> {
        let pool = CredentialPool::new(name.clone(), definitions)?;
        let size = pool.len();
        let replaced = self.registry.install(pool).await;

        let _ = self.event_bus.publish(PoolEvent::PoolCreated {
            pool: name.clone(),
            size,
            replaced,
            timestamp: Utc::now(),
        });

        tracing::info!(pool = %name, size, replaced, "credential pool created");
        Ok(size)
    }

    /// Leases the first free credential of pool `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if the pool does not exist,
    /// or [`GatewayError::PoolExhausted`] if every record is leased.
    pub async fn lease(&self, name: &PoolName) -> Result<CredentialSnapshot, GatewayError> {
        let handle = self.registry.resolve(name).await?;
        let mut pool = handle.lock().await;
        let outcome = pool.lease();
        let remaining = pool.stats().free;
        drop(pool);

        match outcome {
            Ok(snapshot) => {
                let _ = self.event_bus.publish(PoolEvent::CredentialLeased {
                    pool: name.clone(),
                    username: snapshot.username.clone(),
                    remaining,
                    timestamp: Utc::now(),
                });
                tracing::debug!(pool = %name, username = %snapshot.username, remaining, "credential leased");
                Ok(snapshot)
            }
            Err(err) => {
                if matches!(err, GatewayError::PoolExhausted(_)) {
                    let _ = self.event_bus.publish(PoolEvent::PoolExhausted {
                        pool: name.clone(),
                        timestamp: Utc::now(),
                    });
                    tracing::warn!(pool = %name, "lease refused: pool exhausted");
                }
                Err(err)
            }
        }
    }

    /// Returns the credential `username` of pool `name` to the free set.
    ///
    /// Releasing an already free credential succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] or
    /// [`GatewayError::CredentialNotFound`].
    pub async fn release(&self, name: &PoolName, username: &str) -> Result<(), GatewayError> {
        let handle = self.registry.resolve(name).await?;
        let was_leased = handle.lock().await.release(username)?;

        let _ = self.event_bus.publish(PoolEvent::CredentialReleased {
            pool: name.clone(),
            username: username.to_string(),
            was_leased,
            timestamp: Utc::now(),
        });

        tracing::debug!(pool = %name, username, was_leased, "credential released");
        Ok(())
    }

    /// Sets a property on credential `username` of pool `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a blank or reserved
    /// key, [`GatewayError::PoolNotFound`] or
    /// [`GatewayError::CredentialNotFound`].
    pub async fn update_property(
        &self,
        name: &PoolName,
        username: &str,
        property: &str,
        value: serde_json::Value,
    ) -> Result<(), GatewayError> {
        let handle = self.registry.resolve(name).await?;
        handle
            .lock()
            .await
            .update_property(username, property, value)?;

        let _ = self.event_bus.publish(PoolEvent::PropertyUpdated {
            pool: name.clone(),
            username: username.to_string(),
            property: property.to_string(),
            timestamp: Utc::now(),
        });

        tracing::debug!(pool = %name, username, property, "credential property updated");
        Ok(())
    }

    /// Returns a snapshot of credential `username` without leasing it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] or
    /// [`GatewayError::CredentialNotFound`].
    pub async fn lookup(
        &self,
        name: &PoolName,
        username: &str,
    ) -> Result<CredentialSnapshot, GatewayError> {
        let handle = self.registry.resolve(name).await?;
        let snapshot = handle.lock().await.lookup(username)?;
        tracing::debug!(pool = %name, username, "credential looked up");
        Ok(snapshot)
    }

    /// Removes pool `name`, returning its final counters.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
    pub async fn remove_pool(&self, name: &PoolName) -> Result<PoolStats, GatewayError> {
        let stats = self.registry.remove(name).await?;

        let _ = self.event_bus.publish(PoolEvent::PoolRemoved {
            pool: name.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(pool = %name, leased = stats.leased, "credential pool removed");
        Ok(stats)
    }

    /// Returns summaries of all pools sorted by name.
    pub async fn list_pools(&self) -> Vec<PoolSummary> {
        self.registry.list().await
    }
}
