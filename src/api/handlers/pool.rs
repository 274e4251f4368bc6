//! Pool overview handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{PoolListResponse, PoolSummaryDto};
use crate::app_state::AppState;

/// `GET /pools`: List every pool with its free/leased counters.
#[utoipa::path(
    get,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "List pools",
    description = "Returns every pool sorted by name with its size and how many credentials are free or leased. The default pool has an empty name.",
    responses(
        (status = 200, description = "Pool list", body = PoolListResponse),
    )
)]
pub async fn list_pools(State(state): State<AppState>) -> impl IntoResponse {
    let data: Vec<PoolSummaryDto> = state
        .credential_service
        .list_pools()
        .await
        .into_iter()
        .map(PoolSummaryDto::from)
        .collect();

    Json(PoolListResponse { data })
}

/// Pool overview routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/pools", get(list_pools))
}
