//! Pool listing DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::PoolSummary;

/// One pool in `GET /pools`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolSummaryDto {
    /// Pool name (empty for the default pool).
    pub pool: String,
    /// Total number of credentials.
    pub size: usize,
    /// Credentials available for leasing.
    pub free: usize,
    /// Credentials currently leased.
    pub leased: usize,
    /// When the pool was last created or replaced.
    pub created_at: DateTime<Utc>,
}

impl From<PoolSummary> for PoolSummaryDto {
    fn from(summary: PoolSummary) -> Self {
        Self {
            pool: summary.name.as_str().to_string(),
            size: summary.stats.size,
            free: summary.stats.free,
            leased: summary.stats.leased,
            created_at: summary.created_at,
        }
    }
}

/// Response body for `GET /pools`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolListResponse {
    /// Pool summaries sorted by name.
    pub data: Vec<PoolSummaryDto>,
}
