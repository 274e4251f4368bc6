//! credential-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints and runs
//! until SIGINT or SIGTERM.

use tracing_subscriber::EnvFilter;

use credential_gateway::config::{GatewayConfig, LogFormat};
use credential_gateway::server::{build_app, build_state, shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    init_tracing(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        auto_create_pools = config.auto_create_pools,
        "starting credential-gateway"
    );

    // Registry lives exactly as long as this process serves requests
    let state = build_state(&config);
    let app = build_app(state, &config);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
