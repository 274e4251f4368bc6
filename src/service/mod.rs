//! Service layer: business logic orchestration.
//!
//! [`CredentialService`] coordinates pool operations on the
//! [`crate::domain::PoolRegistry`] and emits events through the
//! [`crate::domain::EventBus`].

pub mod credential_service;

pub use credential_service::CredentialService;
