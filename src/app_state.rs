//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::CredentialService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Credential service for all pool operations.
    pub credential_service: Arc<CredentialService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Builds the state from an already constructed service.
    #[must_use]
    pub fn new(credential_service: Arc<CredentialService>) -> Self {
        let event_bus = credential_service.event_bus().clone();
        Self {
            credential_service,
            event_bus,
        }
    }
}
