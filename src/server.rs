//! HTTP server assembly and lifecycle.
//!
//! [`build_app`] wires the REST and WebSocket routes onto an [`AppState`].
//! [`CredentialServer`] owns one registry for its whole run: it is built on
//! [`CredentialServer::start`] and dropped after [`CredentialServer::stop`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::GatewayConfig;
use crate::domain::{EventBus, PoolRegistry};
use crate::service::CredentialService;
use crate::ws::handler::ws_handler;

/// Builds the domain and service layers described by `config`.
#[must_use]
pub fn build_state(config: &GatewayConfig) -> AppState {
    let registry = Arc::new(PoolRegistry::with_auto_create(config.auto_create_pools));
    let event_bus = EventBus::new(config.event_bus_capacity);
    AppState::new(Arc::new(CredentialService::new(registry, event_bus)))
}

/// Builds the full router: REST API, `/ws`, tracing, CORS and timeouts.
pub fn build_app(state: AppState, config: &GatewayConfig) -> Router {
    let router = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
        )
    };

    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A running credential server bound to a local address.
#[derive(Debug)]
pub struct CredentialServer {
    local_addr: SocketAddr,
    state: AppState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl CredentialServer {
    /// Binds `config.listen_addr` and serves in a background task.
    ///
    /// Use port `0` (see [`GatewayConfig::ephemeral`]) to let the OS pick.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the address cannot be bound.
    pub async fn start(config: GatewayConfig) -> std::io::Result<Self> {
        let state = build_state(&config);
        let app = build_app(state.clone(), &config);

        let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!(addr = %local_addr, "credential server listening");
        Ok(Self {
            local_addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }

    /// Returns the bound address (with the real port when `0` was asked for).
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns `http://<local_addr>`, ready to hand to a client.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Returns the state shared with the request handlers.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Stops accepting connections and waits for in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the server failed while running, or
    /// [`std::io::ErrorKind::Other`] if the server task panicked.
    pub async fn stop(mut self) -> std::io::Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let result = self.task.await.map_err(std::io::Error::other)?;
        tracing::info!(addr = %self.local_addr, "credential server stopped");
        result
    }
}

/// Resolves when SIGINT (Ctrl+C) or SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn app() -> Router {
        let config = GatewayConfig::ephemeral();
        build_app(build_state(&config), &config)
    }

    fn request(method: Method, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let result = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        };
        result.unwrap_or_else(|e| panic!("bad request: {e}"))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        serde_json::from_slice(&bytes).unwrap_or_default()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let Ok(response) = app().oneshot(request(Method::GET, "/health", None)).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn lease_without_pool_is_not_found() {
        let Ok(response) = app()
            .oneshot(request(Method::GET, "/api/v1/credentials", None))
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body.pointer("/error/code"), Some(&serde_json::json!(2001)));
    }

    #[tokio::test]
    async fn empty_pool_body_is_bad_request() {
        let Ok(response) = app()
            .oneshot(request(
                Method::POST,
                "/api/v1/credentials",
                Some(serde_json::json!([])),
            ))
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let Ok(response) = app()
            .oneshot(request(
                Method::POST,
                "/api/v1/credentials?pool=a",
                Some(serde_json::json!({"username": "not-a-list"})),
            ))
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_then_lease_over_router() {
        let config = GatewayConfig::ephemeral();
        let state = build_state(&config);
        let app = build_app(state, &config);

        let body = serde_json::json!([
            {"username": "user1", "password": "password"},
            {"username": "user2", "password": "password"},
        ]);
        let Ok(created) = app
            .clone()
            .oneshot(request(Method::POST, "/api/v1/credentials?pool=web", Some(body)))
            .await
        else {
            panic!("create failed");
        };
        assert_eq!(created.status(), StatusCode::CREATED);

        let Ok(leased) = app
            .clone()
            .oneshot(request(Method::GET, "/api/v1/credentials?pool=web", None))
            .await
        else {
            panic!("lease failed");
        };
        assert_eq!(leased.status(), StatusCode::OK);
        let snapshot = json_body(leased).await;
        assert_eq!(
            snapshot,
            serde_json::json!({"username": "user1", "password": "password"})
        );

        let Ok(pools) = app
            .oneshot(request(Method::GET, "/api/v1/pools", None))
            .await
        else {
            panic!("list failed");
        };
        let list = json_body(pools).await;
        assert_eq!(list.pointer("/data/0/leased"), Some(&serde_json::json!(1)));
        assert!(list.pointer("/data/0/created_at").is_some_and(|v| v.is_string()));
    }

    #[tokio::test]
    async fn malformed_query_gets_json_error_body() {
        let Ok(response) = app()
            .oneshot(request(
                Method::GET,
                "/api/v1/credentials?pool=a&pool=b",
                None,
            ))
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body.pointer("/error/code"), Some(&serde_json::json!(1001)));
    }

    #[tokio::test]
    async fn credential_named_update_can_be_looked_up() {
        let app = app();
        let body = serde_json::json!([
            {"username": "user1"},
            {"username": "update", "password": "pw"},
        ]);
        let Ok(created) = app
            .clone()
            .oneshot(request(Method::POST, "/api/v1/credentials?pool=r", Some(body)))
            .await
        else {
            panic!("create failed");
        };
        assert_eq!(created.status(), StatusCode::CREATED);

        let Ok(found) = app
            .clone()
            .oneshot(request(Method::GET, "/api/v1/credentials/update?pool=r", None))
            .await
        else {
            panic!("lookup failed");
        };
        assert_eq!(found.status(), StatusCode::OK);
        assert_eq!(
            json_body(found).await,
            serde_json::json!({"username": "update", "password": "pw"})
        );

        let Ok(pools) = app
            .oneshot(request(Method::GET, "/api/v1/pools", None))
            .await
        else {
            panic!("list failed");
        };
        let list = json_body(pools).await;
        assert_eq!(list.pointer("/data/0/leased"), Some(&serde_json::json!(0)));
    }

    #[tokio::test]
    async fn dot_segment_username_is_bad_request() {
        let Ok(response) = app()
            .oneshot(request(
                Method::POST,
                "/api/v1/credentials?pool=d",
                Some(serde_json::json!([{"username": "user1"}, {"username": ".."}])),
            ))
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn server_starts_and_stops() {
        let Ok(server) = CredentialServer::start(GatewayConfig::ephemeral()).await else {
            panic!("bind failed");
        };
        assert_ne!(server.local_addr().port(), 0);
        assert!(server.base_url().starts_with("http://127.0.0.1:"));
        assert!(server.stop().await.is_ok());
    }
}
