//! REST API layer: route handlers, DTOs, router composition, and the
//! OpenAPI document.
//!
//! Credential endpoints are mounted under `/api/v1`; `/health` sits at
//! the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "credential-gateway",
        description = "Exclusive short-lived leases on pooled credentials"
    ),
    paths(
        handlers::credentials::create_pool,
        handlers::credentials::lease_credentials,
        handlers::credentials::release_credentials,
        handlers::credentials::update_property,
        handlers::credentials::lookup_credentials,
        handlers::credentials::remove_pool,
        handlers::pool::list_pools,
        handlers::system::health_handler,
    ),
    components(schemas(
        dto::CreatePoolResponse,
        dto::ReleaseRequest,
        dto::UpdatePropertyRequest,
        dto::AckResponse,
        dto::PoolSummaryDto,
        dto::PoolListResponse,
        handlers::system::HealthResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Credentials", description = "Create pools, lease, release, update and look up credentials"),
        (name = "Pools", description = "Pool overview"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_credential_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/v1/credentials"));
        assert!(paths.contains_key("/api/v1/credentials/update"));
        assert!(paths.contains_key("/api/v1/credentials/{username}"));
        assert!(paths.contains_key("/api/v1/pools"));
        assert!(paths.contains_key("/health"));
    }
}
