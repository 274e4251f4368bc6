//! # credential-gateway
//!
//! Short-lived, mutually exclusive leases on shared credentials (test
//! accounts and the like), so that no two concurrent consumers ever run
//! with the same identity at once.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket, CredentialClient)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── CredentialService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     └── PoolRegistry → CredentialPool → CredentialRecord (domain/)
//! ```
//!
//! A pool is created explicitly with a list of credentials. `lease` hands
//! out the first free credential in creation order and fails immediately
//! when none is free; `release` puts it back. Both trust the username the
//! caller supplies.

pub mod api;
pub mod app_state;
#[cfg(feature = "client")]
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod ws;
