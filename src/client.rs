//! HTTP client for the credential gateway.
//!
//! [`CredentialClient`] maps each pool operation to one REST call.
//! [`CredentialSession`] layers the usual test-run discipline on top:
//! lease once, reuse the cached credential, release exactly once.

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::api::dto::{AckResponse, CreatePoolResponse, ReleaseRequest, UpdatePropertyRequest};
use crate::config::DEFAULT_PORT;
use crate::domain::{CredentialDefinition, CredentialSnapshot, is_dot_segment};
use crate::error::ErrorResponse;

/// Client-side failure.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The base URL could not be parsed or cannot hold a path.
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    /// The username cannot be placed in a URL path (`.` or `..`).
    #[error("username {0:?} cannot be addressed in a URL path")]
    InvalidUsername(String),

    /// Transport or decoding failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with an error body.
    #[error("gateway error {code} (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Gateway error code (`0` if the body could not be decoded).
        code: u32,
        /// Gateway error message.
        message: String,
    },

    /// The session holds no credential to act on.
    #[error("no credential is leased in this session")]
    NoActiveLease,
}

impl ClientError {
    /// Returns `true` if the pool had no free credential.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Api { code: 2003, .. })
    }

    /// Returns `true` if the pool or the username does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

/// Thin REST client; one method per pool operation.
///
/// Every method takes an optional pool name; `None` targets the default
/// pool.
#[derive(Debug, Clone)]
pub struct CredentialClient {
    http: reqwest::Client,
    base: reqwest::Url,
}

impl CredentialClient {
    /// Creates a client for the gateway at `base_url` (e.g. `http://localhost:3099`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Creates a client for a gateway on this machine's default port.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches [`CredentialClient::new`].
    pub fn local() -> Result<Self, ClientError> {
        Self::new(&format!("http://localhost:{DEFAULT_PORT}"))
    }

    /// Like [`CredentialClient::new`] but reuses an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Result<Self, ClientError> {
        let base = reqwest::Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { http, base })
    }

    /// Starts a session bound to `pool`.
    #[must_use]
    pub fn session(&self, pool: Option<&str>) -> CredentialSession {
        CredentialSession {
            client: self.clone(),
            pool: pool.map(str::to_string),
            cached: Mutex::new(None),
        }
    }

    /// Creates (or replaces) a pool.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with code 1001 on an empty list or
    /// duplicate usernames, or [`ClientError::Http`] on transport failure.
    pub async fn create_pool(
        &self,
        pool: Option<&str>,
        credentials: &[CredentialDefinition],
    ) -> Result<CreatePoolResponse, ClientError> {
        let url = self.endpoint(&[], pool)?;
        let response = self.http.post(url).json(credentials).send().await?;
        decode(response).await
    }

    /// Leases the next free credential.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`]; see [`ClientError::is_exhausted`] and
    /// [`ClientError::is_not_found`].
    pub async fn lease(&self, pool: Option<&str>) -> Result<CredentialSnapshot, ClientError> {
        let url = self.endpoint(&[], pool)?;
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    /// Releases the credential `username`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] if the pool or username does not exist.
    pub async fn release(&self, pool: Option<&str>, username: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&[], pool)?;
        let body = ReleaseRequest {
            username: username.to_string(),
        };
        let response = self.http.put(url).json(&body).send().await?;
        decode::<AckResponse>(response).await.map(|_| ())
    }

    /// Sets `property` to `value` on the credential `username`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] if the pool or username does not exist
    /// or the property name is rejected.
    pub async fn update_property(
        &self,
        pool: Option<&str>,
        username: &str,
        property: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["update"], pool)?;
        let body = UpdatePropertyRequest {
            username: username.to_string(),
            property: property.to_string(),
            value: value.into(),
        };
        let response = self.http.put(url).json(&body).send().await?;
        decode::<AckResponse>(response).await.map(|_| ())
    }

    /// Reads the credential `username` without leasing it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUsername`] for `.` or `..` without
    /// contacting the gateway, or [`ClientError::Api`] if the pool or
    /// username does not exist.
    pub async fn lookup(
        &self,
        pool: Option<&str>,
        username: &str,
    ) -> Result<CredentialSnapshot, ClientError> {
        let url = self.endpoint(&[username], pool)?;
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    /// Drops a whole pool.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] if the pool does not exist.
    pub async fn remove_pool(&self, pool: Option<&str>) -> Result<(), ClientError> {
        let url = self.endpoint(&[], pool)?;
        let response = self.http.delete(url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(api_error(status, response).await)
    }

    /// Builds `<base>/api/v1/credentials[/<segments>...][?pool=<pool>]`,
    /// percent-encoding every segment.
    ///
    /// Dot segments are refused: the URL parser would drop them and the
    /// request would land on `/credentials` itself.
    fn endpoint(&self, segments: &[&str], pool: Option<&str>) -> Result<reqwest::Url, ClientError> {
        if let Some(segment) = segments.iter().find(|s| is_dot_segment(s)) {
            return Err(ClientError::InvalidUsername((*segment).to_string()));
        }
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ClientError::InvalidUrl(self.base.to_string()))?;
            path.pop_if_empty().extend(["api", "v1", "credentials"]);
            path.extend(segments);
        }
        if let Some(pool) = pool {
            url.query_pairs_mut().append_pair("pool", pool);
        }
        Ok(url)
    }
}

/// Decodes a success body as `T`, or the gateway error body otherwise.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    Err(api_error(status, response).await)
}

async fn api_error(status: reqwest::StatusCode, response: reqwest::Response) -> ClientError {
    match response.json::<ErrorResponse>().await {
        Ok(body) => ClientError::Api {
            status: status.as_u16(),
            code: body.error.code,
            message: body.error.message,
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            code: 0,
            message: status.to_string(),
        },
    }
}

/// One consumer's view of a pool: at most one cached credential.
///
/// Calls are serialized per session, so concurrent `credentials()` calls
/// on the same session share a single lease.
#[derive(Debug)]
pub struct CredentialSession {
    client: CredentialClient,
    pool: Option<String>,
    cached: Mutex<Option<CredentialSnapshot>>,
}

impl CredentialSession {
    /// Returns the pool this session is bound to (`None` = default pool).
    #[must_use]
    pub fn pool(&self) -> Option<&str> {
        self.pool.as_deref()
    }

    /// Returns the cached credential, leasing one on first use.
    ///
    /// # Errors
    ///
    /// Returns the lease error if nothing is cached and the lease fails;
    /// nothing is cached in that case.
    pub async fn credentials(&self) -> Result<CredentialSnapshot, ClientError> {
        let mut cached = self.cached.lock().await;
        if let Some(snapshot) = cached.as_ref() {
            return Ok(snapshot.clone());
        }
        let snapshot = self.client.lease(self.pool()).await?;
        tracing::debug!(username = %snapshot.username, "session leased credential");
        *cached = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Returns the cached credential without contacting the gateway.
    pub async fn current(&self) -> Option<CredentialSnapshot> {
        self.cached.lock().await.clone()
    }

    /// Sets a property on the cached credential, on the gateway and locally.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoActiveLease`] if nothing is cached, or the
    /// gateway error.
    pub async fn update_property(
        &self,
        property: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<(), ClientError> {
        let mut cached = self.cached.lock().await;
        let snapshot = cached.as_mut().ok_or(ClientError::NoActiveLease)?;
        let value = value.into();
        self.client
            .update_property(self.pool(), &snapshot.username, property, value.clone())
            .await?;
        snapshot.properties.insert(property.to_string(), value);
        Ok(())
    }

    /// Releases the cached credential and clears the cache.
    ///
    /// On failure the credential stays cached so the call can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoActiveLease`] if nothing is cached, or the
    /// gateway error.
    pub async fn free(&self) -> Result<(), ClientError> {
        let mut cached = self.cached.lock().await;
        let snapshot = cached.as_ref().ok_or(ClientError::NoActiveLease)?;
        self.client.release(self.pool(), &snapshot.username).await?;
        tracing::debug!(username = %snapshot.username, "session released credential");
        *cached = None;
        Ok(())
    }

    /// Replaces the cached credential with a direct lookup of `username`.
    ///
    /// The looked-up credential is not leased; a later [`Self::free`]
    /// still releases it.
    ///
    /// # Errors
    ///
    /// Returns the lookup error; the cache is left unchanged in that case.
    pub async fn lookup_into(&self, username: &str) -> Result<CredentialSnapshot, ClientError> {
        let mut cached = self.cached.lock().await;
        let snapshot = self.client.lookup(self.pool(), username).await?;
        *cached = Some(snapshot.clone());
        Ok(snapshot)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn client(base: &str) -> CredentialClient {
        CredentialClient::new(base).unwrap_or_else(|e| panic!("bad client: {e}"))
    }

    #[test]
    fn endpoint_without_pool() {
        let Ok(url) = client("http://localhost:3099").endpoint(&[], None) else {
            panic!("endpoint");
        };
        assert_eq!(url.as_str(), "http://localhost:3099/api/v1/credentials");
    }

    #[test]
    fn endpoint_with_pool_and_segment() {
        let Ok(url) = client("http://localhost:3099/").endpoint(&["update"], Some("a b")) else {
            panic!("endpoint");
        };
        assert_eq!(
            url.as_str(),
            "http://localhost:3099/api/v1/credentials/update?pool=a+b"
        );
    }

    #[test]
    fn endpoint_escapes_username() {
        let Ok(url) = client("http://gw").endpoint(&["a/b"], None) else {
            panic!("endpoint");
        };
        assert_eq!(url.as_str(), "http://gw/api/v1/credentials/a%2Fb");
    }

    #[test]
    fn endpoint_refuses_dot_segments() {
        let gw = client("http://gw");
        for name in [".", ".."] {
            assert!(
                matches!(gw.endpoint(&[name], None), Err(ClientError::InvalidUsername(ref u)) if u == name),
                "{name:?} built a url"
            );
        }
        let Ok(url) = gw.endpoint(&["..."], None) else {
            panic!("endpoint");
        };
        assert_eq!(url.as_str(), "http://gw/api/v1/credentials/...");
    }

    #[tokio::test]
    async fn lookup_of_dot_segment_never_sends_a_request() {
        // Port 1 is closed: reaching the network would surface as `Http`.
        let gw = client("http://127.0.0.1:1");
        assert!(matches!(
            gw.lookup(None, "..").await,
            Err(ClientError::InvalidUsername(_))
        ));
        let session = gw.session(None);
        assert!(matches!(
            session.lookup_into(".").await,
            Err(ClientError::InvalidUsername(_))
        ));
        assert!(session.current().await.is_none());
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let Ok(url) = client("http://gw/creds").endpoint(&[], None) else {
            panic!("endpoint");
        };
        assert_eq!(url.as_str(), "http://gw/creds/api/v1/credentials");
    }

    #[test]
    fn invalid_base_is_rejected() {
        assert!(matches!(
            CredentialClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            CredentialClient::new("mailto:someone@example.com"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn default_targets_local_port() {
        let Ok(url) = CredentialClient::local().and_then(|c| c.endpoint(&[], None)) else {
            panic!("endpoint");
        };
        assert_eq!(url.port(), Some(DEFAULT_PORT));
    }

    #[test]
    fn error_classification() {
        let exhausted = ClientError::Api {
            status: 409,
            code: 2003,
            message: String::new(),
        };
        assert!(exhausted.is_exhausted());
        assert!(!exhausted.is_not_found());
        assert!(!ClientError::NoActiveLease.is_exhausted());
    }

    #[tokio::test]
    async fn session_without_lease_cannot_free() {
        let session = client("http://localhost:1").session(Some("a"));
        assert!(matches!(session.free().await, Err(ClientError::NoActiveLease)));
        assert!(matches!(
            session.update_property("cookie", "x").await,
            Err(ClientError::NoActiveLease)
        ));
        assert!(session.current().await.is_none());
    }
}
