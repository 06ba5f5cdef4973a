//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `EMPORIUM_API_BASE_URL` - Backend origin (e.g., `https://api.example.com`)
//!
//! ## Optional
//! - `EMPORIUM_STATE_DIR` - Directory for persisted auth/cart state (default: `.emporium`)
//! - `EMPORIUM_ACCESS_TOKEN_TTL_SECS` - Local access token lifetime estimate (default: 295)
//! - `EMPORIUM_HTTP_TIMEOUT_SECS` - Request timeout (default: 30)
//! - `EMPORIUM_CATALOG_CACHE_TTL_SECS` - Product/category cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default local estimate of the access token lifetime: 5 × 59 seconds,
/// slightly under the backend's five minutes so refresh happens proactively.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 5 * 59;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend REST API settings
    pub api: ApiConfig,
    /// Directory holding the persisted state blobs
    pub state_dir: PathBuf,
    /// Local estimate of how long a fresh access token stays valid
    pub access_token_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend origin; endpoints live under `{base_url}/api/v1/`
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Lifetime of cached catalog responses
    pub catalog_cache_ttl: Duration,
}

impl ApiConfig {
    /// Configuration for a backend at `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not an http(s) URL with a host.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("EMPORIUM_API_BASE_URL", base_url)?,
            timeout: Duration::from_secs(30),
            catalog_cache_ttl: Duration::from_secs(300),
        })
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = get_required_env("EMPORIUM_API_BASE_URL")?;
        let api = ApiConfig {
            base_url: parse_base_url("EMPORIUM_API_BASE_URL", &base_url)?,
            timeout: Duration::from_secs(get_secs_or_default("EMPORIUM_HTTP_TIMEOUT_SECS", 30)?),
            catalog_cache_ttl: Duration::from_secs(get_secs_or_default(
                "EMPORIUM_CATALOG_CACHE_TTL_SECS",
                300,
            )?),
        };

        Ok(Self {
            api,
            state_dir: PathBuf::from(get_env_or_default("EMPORIUM_STATE_DIR", ".emporium")),
            access_token_ttl: Duration::from_secs(get_secs_or_default(
                "EMPORIUM_ACCESS_TOKEN_TTL_SECS",
                DEFAULT_ACCESS_TOKEN_TTL_SECS,
            )?),
            sentry_dsn: get_optional_env("SENTRY_DSN").map(SecretString::from),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a positive number of seconds, falling back to `default` when unset.
fn get_secs_or_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(secs) => Ok(secs),
        Err(e) => Err(ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

/// Parse and check a backend base URL.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL must have a host".to_string(),
        ));
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_accepts_http_and_https() {
        assert!(parse_base_url("K", "http://localhost:9090").is_ok());
        assert!(parse_base_url("K", "https://api.example.com/").is_ok());
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        let err = parse_base_url("K", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(parse_base_url("K", "not a url").is_err());
    }

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::new("http://localhost:9090").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_default_ttl_is_under_five_minutes() {
        assert_eq!(DEFAULT_ACCESS_TOKEN_TTL_SECS, 295);
    }
}
