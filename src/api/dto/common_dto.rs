//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::PoolName;

/// `?pool=<name>` query parameter accepted by every credential endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PoolQuery {
    /// Pool name. Omitted or empty selects the default pool.
    #[serde(default)]
    pub pool: Option<String>,
}

impl PoolQuery {
    /// Resolves the query to a [`PoolName`].
    #[must_use]
    pub fn pool_name(&self) -> PoolName {
        PoolName::from_optional(self.pool.as_deref())
    }
}

/// Acknowledgement returned by release and update.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AckResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Pool the operation applied to (empty for the default pool).
    pub pool: String,
}

impl AckResponse {
    /// Builds an acknowledgement for `pool`.
    #[must_use]
    pub fn ok(pool: &PoolName) -> Self {
        Self {
            status: "ok".to_string(),
            pool: pool.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pool_is_default() {
        assert!(PoolQuery::default().pool_name().is_default());
    }

    #[test]
    fn named_pool_is_resolved() {
        let query = PoolQuery {
            pool: Some("admins".to_string()),
        };
        assert_eq!(query.pool_name(), PoolName::new("admins"));
    }
}
