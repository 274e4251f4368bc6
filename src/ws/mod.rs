//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams lease lifecycle events for the
//! pools a client subscribes to.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
