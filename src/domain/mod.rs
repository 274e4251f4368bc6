//! Domain layer: credential records, pools, the registry, and events.
//!
//! This module contains the lease state machine ([`CredentialPool`]),
//! the concurrent pool store ([`PoolRegistry`]), and the event bus used
//! to broadcast lease lifecycle changes.

pub mod credential;
pub mod credential_pool;
pub mod event_bus;
pub mod pool_event;
pub mod pool_name;
pub mod pool_registry;

pub use credential::{
    CredentialDefinition, CredentialRecord, CredentialSnapshot, LeaseState, is_dot_segment,
};
pub use credential_pool::{CredentialPool, PoolStats};
pub use event_bus::EventBus;
pub use pool_event::PoolEvent;
pub use pool_name::PoolName;
pub use pool_registry::{PoolRegistry, PoolSummary};
