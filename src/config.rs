//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

/// Default port of the credential server.
pub const DEFAULT_PORT: u16 = 3099;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3099`).
    pub listen_addr: SocketAddr,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Create an empty pool when an unknown pool name is referenced.
    pub auto_create_pools: bool,

    /// Transport-level timeout applied to every HTTP request.
    pub request_timeout: Duration,

    /// Tracing output format.
    pub log_format: LogFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            event_bus_capacity: 1024,
            auto_create_pools: false,
            request_timeout: Duration::from_secs(30),
            log_format: LogFormat::Text,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity);
        let auto_create_pools = parse_env_bool("AUTO_CREATE_POOLS", defaults.auto_create_pools);
        let request_timeout = Duration::from_secs(parse_env(
            "REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        ));
        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            event_bus_capacity,
            auto_create_pools,
            request_timeout,
            log_format,
        })
    }

    /// Returns a copy bound to an ephemeral port on loopback.
    ///
    /// Handy for embedding the server in a test run.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Self::default()
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_3099() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.listen_addr.port(), DEFAULT_PORT);
        assert!(!cfg.auto_create_pools);
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn ephemeral_binds_loopback_port_zero() {
        let cfg = GatewayConfig::ephemeral();
        assert!(cfg.listen_addr.ip().is_loopback());
        assert_eq!(cfg.listen_addr.port(), 0);
    }

    #[test]
    fn missing_variables_fall_back() {
        assert_eq!(parse_env("CREDENTIAL_GATEWAY_TEST_UNSET_NUM", 7_u64), 7);
        assert!(parse_env_bool("CREDENTIAL_GATEWAY_TEST_UNSET_BOOL", true));
    }
}
