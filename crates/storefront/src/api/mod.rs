//! REST client for the storefront backend.
//!
//! # Architecture
//!
//! - JSON over HTTP(S) under `{base_url}/api/v1/`
//! - Bearer access tokens for authenticated calls; the long-lived refresh token
//!   travels as an HTTP-only cookie kept in a `reqwest` cookie jar
//! - Success bodies are `{ "data": ... }`, error bodies are `{ "message": ... }`
//! - Read-only catalog responses are cached in-process via `moka`
//!
//! The client is stateless with respect to the session: callers pass the
//! access token explicitly, normally through [`crate::token::with_valid_token`].
//!
//! # Example
//!
//! ```rust,ignore
//! use emporium_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let auth = client.login("ada@example.com", &password).await?;
//! let cart = client.get_cart(auth.user_id, &auth.access_token).await?;
//! ```

mod addresses;
mod auth;
mod cache;
mod carts;
mod catalog;
mod orders;
pub mod types;
mod users;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use moka::future::Cache;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use emporium_core::ImageId;

use crate::config::ApiConfig;
use cache::CacheValue;
use types::{DataEnvelope, ErrorEnvelope};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend rejected the credentials (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response; `message` comes from the error envelope.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },
}

impl ApiError {
    /// The user-facing message, without transport details.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(message) | Self::NotFound(message) => message.clone(),
            Self::Api { message, .. } => message.clone(),
            Self::RateLimited(secs) => format!("Too many requests, try again in {secs} seconds"),
            Self::Http(_) => "Could not reach the store, please try again".to_string(),
            Self::Parse(_) => "Unexpected response from the store".to_string(),
        }
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheaply cloneable; clones share the connection pool, cookie jar and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cookies: Arc<SessionJar>,
    cache: Cache<String, CacheValue>,
}

/// Cookie jar that can be emptied on logout.
///
/// `reqwest`'s [`Jar`] has no way to drop cookies, so the jar is swapped
/// for a fresh one instead.
#[derive(Default)]
struct SessionJar(RwLock<Jar>);

impl SessionJar {
    fn jar(&self) -> RwLockReadGuard<'_, Jar> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Jar::default();
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.jar().set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar().cookies(url)
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let cookies = Arc::new(SessionJar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .timeout(config.timeout)
            .user_agent(concat!("Emporium/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cookies,
                cache,
            }),
        })
    }

    /// The backend origin.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Public download URL of a stored image.
    #[must_use]
    pub fn image_url(&self, image_id: ImageId) -> String {
        self.endpoint(&format!("images/image/download/{image_id}"))
    }

    // =========================================================================
    // Refresh cookie persistence
    // =========================================================================

    /// The `Cookie` header the jar would send to the backend, if any.
    ///
    /// Persist this between processes so a later run can still refresh.
    #[must_use]
    pub fn export_cookies(&self) -> Option<String> {
        self.inner
            .cookies
            .cookies(&self.inner.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Restore cookies previously returned by [`Self::export_cookies`].
    pub fn restore_cookies(&self, header: &str) {
        let jar = self.inner.cookies.jar();
        for pair in header.split(';').map(str::trim).filter(|p| p.contains('=')) {
            jar.add_cookie_str(&format!("{pair}; Path=/"), &self.inner.base_url);
        }
    }

    /// Drop every cookie, including the refresh token.
    pub fn clear_cookies(&self) {
        self.inner.cookies.clear();
        debug!("Cookie jar cleared");
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/v1/{}",
            self.inner.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Start a request with a fresh `X-Request-Id`.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request_id = Uuid::new_v4();
        debug!(%method, path, %request_id, "API request");
        self.inner
            .client
            .request(method, self.endpoint(path))
            .header("X-Request-Id", request_id.to_string())
    }

    /// Start a request carrying a bearer token.
    fn authed(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.request(method, path).bearer_auth(token)
    }

    /// Send a request and decode the raw JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let text = self.send_text(request, fallback).await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request and unwrap the `{ data }` envelope.
    async fn send_data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let envelope: DataEnvelope<T> = self.send_json(request, fallback).await?;
        Ok(envelope.data)
    }

    /// Send a request whose body is irrelevant.
    async fn send_empty(&self, request: RequestBuilder, fallback: &str) -> Result<(), ApiError> {
        self.send_text(request, fallback).await.map(|_| ())
    }

    /// Send a request and return the body of a success response.
    ///
    /// Non-success responses are mapped to [`ApiError`], taking the message
    /// from the `{ message }` envelope or falling back to `fallback`.
    async fn send_text(&self, request: RequestBuilder, fallback: &str) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let text = response.text().await?;
        if status.is_success() {
            return Ok(text);
        }

        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .ok()
            .and_then(|e| e.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());

        warn!(status = %status, message = %message, "API returned non-success status");

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_error_envelope_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/orders/user"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"message": "No orders for guest"})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.user_orders("tok").await.unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 400, .. }));
        assert_eq!(err.user_message(), "No orders for guest");
    }

    #[tokio::test]
    async fn test_fallback_message_when_body_is_not_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/orders/user"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = test_client(&server).user_orders("tok").await.unwrap_err();
        assert_eq!(err.user_message(), "Failed to fetch orders");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/orders/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/addresses"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(matches!(
            client.user_orders("tok").await,
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            client.addresses("tok").await,
            Err(ApiError::RateLimited(7))
        ));
    }

    #[tokio::test]
    async fn test_requests_carry_bearer_and_request_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/orders/user"))
            .and(header("Authorization", "Bearer tok-123"))
            .and(header_exists("X-Request-Id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let orders = test_client(&server).user_orders("tok-123").await.unwrap();
        assert!(orders.is_empty());
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = ApiClient::new(&ApiConfig::new("http://localhost:9090/").unwrap()).unwrap();
        assert_eq!(
            client.endpoint("/carts/user/1/cart"),
            "http://localhost:9090/api/v1/carts/user/1/cart"
        );
        assert_eq!(
            client.image_url(ImageId::new(4)),
            "http://localhost:9090/api/v1/images/image/download/4"
        );
    }

    #[test]
    fn test_cookie_export_and_restore() {
        let config = ApiConfig::new("http://localhost:9090").unwrap();
        let first = ApiClient::new(&config).unwrap();
        assert!(first.export_cookies().is_none());

        first.restore_cookies("refreshToken=abc123");
        let exported = first.export_cookies().unwrap();
        assert_eq!(exported, "refreshToken=abc123");

        let second = ApiClient::new(&config).unwrap();
        second.restore_cookies(&exported);
        assert_eq!(second.export_cookies().as_deref(), Some("refreshToken=abc123"));
    }

    #[tokio::test]
    async fn test_cleared_jar_stops_sending_refresh_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/refresh-token"))
            .and(header_exists("Cookie"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.restore_cookies("refreshToken=abc123");
        client.clear_cookies();

        assert!(client.export_cookies().is_none());
        let _ = client.refresh_access_token().await;
    }
}
