//! Credential handlers: create pool, lease, release, update, lookup.
//!
//! Every route takes an optional `?pool=<name>` query; without it the
//! default pool is used.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    AckResponse, CreatePoolResponse, PoolQuery, ReleaseRequest, UpdatePropertyRequest,
};
use crate::app_state::AppState;
use crate::domain::CredentialDefinition;
use crate::error::{ErrorResponse, GatewayError};

const UPDATE_SEGMENT: &str = "update";

/// `POST /credentials`: Create or replace a credential pool.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] on a malformed body or query,
/// an empty list, or blank, dot-segment or duplicate usernames.
#[utoipa::path(
    post,
    path = "/api/v1/credentials",
    tag = "Credentials",
    summary = "Create a credential pool",
    description = "Installs a pool built from the given credential list, replacing any pool of the same name. Every credential starts free.",
    params(PoolQuery),
    request_body = Vec<serde_json::Value>,
    responses(
        (status = 201, description = "Pool created", body = CreatePoolResponse),
        (status = 400, description = "Empty list, blank, `.`/`..` or duplicate usernames", body = ErrorResponse),
    )
)]
pub async fn create_pool(
    State(state): State<AppState>,
    query: Result<Query<PoolQuery>, QueryRejection>,
    payload: Result<Json<Vec<CredentialDefinition>>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(query) = query?;
    let Json(definitions) = payload?;
    let pool = query.pool_name();

    let size = state
        .credential_service
        .create_pool(pool.clone(), definitions)
        .await?;

    let response = CreatePoolResponse {
        pool: pool.as_str().to_string(),
        size,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /credentials`: Lease the first free credential.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotFound`] or [`GatewayError::PoolExhausted`].
#[utoipa::path(
    get,
    path = "/api/v1/credentials",
    tag = "Credentials",
    summary = "Lease a credential",
    description = "Marks the first free credential (in creation order) as leased and returns it. Never waits: an exhausted pool answers 409 immediately.",
    params(PoolQuery),
    responses(
        (status = 200, description = "Leased credential", body = serde_json::Value),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "No free credential", body = ErrorResponse),
    )
)]
pub async fn lease_credentials(
    State(state): State<AppState>,
    query: Result<Query<PoolQuery>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(query) = query?;
    let snapshot = state
        .credential_service
        .lease(&query.pool_name())
        .await?;
    Ok(Json(snapshot))
}

/// `PUT /credentials`: Free a leased credential.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotFound`] or
/// [`GatewayError::CredentialNotFound`].
#[utoipa::path(
    put,
    path = "/api/v1/credentials",
    tag = "Credentials",
    summary = "Release a credential",
    description = "Returns the named credential to the free set. Releasing a free credential succeeds.",
    params(PoolQuery),
    request_body = ReleaseRequest,
    responses(
        (status = 200, description = "Credential released", body = AckResponse),
        (status = 404, description = "Pool or username not found", body = ErrorResponse),
    )
)]
pub async fn release_credentials(
    State(state): State<AppState>,
    query: Result<Query<PoolQuery>, QueryRejection>,
    payload: Result<Json<ReleaseRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(query) = query?;
    let Json(req) = payload?;
    let pool = query.pool_name();
    state
        .credential_service
        .release(&pool, &req.username)
        .await?;
    Ok(Json(AckResponse::ok(&pool)))
}

/// `PUT /credentials/update`: Set one property on a credential.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`], [`GatewayError::PoolNotFound`]
/// or [`GatewayError::CredentialNotFound`].
#[utoipa::path(
    put,
    path = "/api/v1/credentials/update",
    tag = "Credentials",
    summary = "Update a credential property",
    description = "Sets `property` to `value` on the named credential, whatever its lease state.",
    params(PoolQuery),
    request_body = UpdatePropertyRequest,
    responses(
        (status = 200, description = "Property updated", body = AckResponse),
        (status = 400, description = "Blank or reserved property name", body = ErrorResponse),
        (status = 404, description = "Pool or username not found", body = ErrorResponse),
    )
)]
pub async fn update_property(
    State(state): State<AppState>,
    query: Result<Query<PoolQuery>, QueryRejection>,
    payload: Result<Json<UpdatePropertyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(query) = query?;
    let Json(req) = payload?;
    let pool = query.pool_name();
    state
        .credential_service
        .update_property(&pool, &req.username, &req.property, req.value)
        .await?;
    Ok(Json(AckResponse::ok(&pool)))
}

/// `GET /credentials/{username}`: Read a credential without leasing it.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotFound`] or
/// [`GatewayError::CredentialNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/credentials/{username}",
    tag = "Credentials",
    summary = "Look up a credential",
    description = "Returns the named credential as it is now. Does not lease it.",
    params(
        ("username" = String, Path, description = "Username to look up"),
        PoolQuery,
    ),
    responses(
        (status = 200, description = "Credential", body = serde_json::Value),
        (status = 404, description = "Pool or username not found", body = ErrorResponse),
    )
)]
pub async fn lookup_credentials(
    State(state): State<AppState>,
    Path(username): Path<String>,
    query: Result<Query<PoolQuery>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(query) = query?;
    let snapshot = state
        .credential_service
        .lookup(&query.pool_name(), &username)
        .await?;
    Ok(Json(snapshot))
}

/// `GET /credentials/update`: Look up the credential named `update`.
///
/// The static update route outranks `/credentials/{username}`, so this
/// handler serves lookups for that one username.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotFound`] or
/// [`GatewayError::CredentialNotFound`].
pub async fn lookup_update_credential(
    State(state): State<AppState>,
    query: Result<Query<PoolQuery>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    lookup_credentials(State(state), Path(UPDATE_SEGMENT.to_string()), query).await
}

/// `DELETE /credentials`: Drop a whole pool.
///
/// # Errors
///
/// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/credentials",
    tag = "Credentials",
    summary = "Remove a credential pool",
    description = "Drops the pool and every credential in it, leased or not.",
    params(PoolQuery),
    responses(
        (status = 204, description = "Pool removed"),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn remove_pool(
    State(state): State<AppState>,
    query: Result<Query<PoolQuery>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(query) = query?;
    state
        .credential_service
        .remove_pool(&query.pool_name())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Credential routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/credentials",
            post(create_pool)
                .get(lease_credentials)
                .put(release_credentials)
                .delete(remove_pool),
        )
        .route(
            "/credentials/update",
            put(update_property).get(lookup_update_credential),
        )
        .route("/credentials/{username}", get(lookup_credentials))
}
