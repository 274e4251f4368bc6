//! Data Transfer Objects for REST request/response serialization.
//!
//! Credential snapshots and definitions are serialized flat
//! (`{"username": ..., ...properties}`) straight from the domain types;
//! the DTOs here cover everything else.

pub mod common_dto;
pub mod credential_dto;
pub mod pool_dto;

pub use common_dto::*;
pub use credential_dto::*;
pub use pool_dto::*;
