//! Credential DTOs for create, release, and update operations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response body for `POST /credentials` (201 Created).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePoolResponse {
    /// Pool name (empty for the default pool).
    pub pool: String,
    /// Number of credentials in the new pool.
    pub size: usize,
}

/// Request body for `PUT /credentials`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReleaseRequest {
    /// Username of the credential to free.
    pub username: String,
}

/// Request body for `PUT /credentials/update`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatePropertyRequest {
    /// Username of the credential to modify.
    pub username: String,
    /// Property key, e.g. `"cookie"`.
    pub property: String,
    /// New value for the property.
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}
