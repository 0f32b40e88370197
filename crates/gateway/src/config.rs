//! Gateway configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GATEWAY_HOST` - Bind address (default: 127.0.0.1)
//! - `GATEWAY_PORT` - Listen port (default: 3000)
//! - `BACKEND_URL` - Backend API base URL (default: <http://localhost:5000>)
//! - `FRONTEND_URL` - Page renderer base URL (default: <http://localhost:3001>)
//! - `VERIFY_TIMEOUT_MS` - Session verification timeout (default: 5000)
//! - `GUARD_AUTH_PREFIXES` - Comma-separated prefixes requiring a session
//!   (default: `/evaluation,/idea,/user`)
//! - `GUARD_ADMIN_PREFIXES` - Comma-separated admin-only prefixes (default: `/admin`)
//! - `GUARD_USER_PREFIXES` - Comma-separated user-area prefixes (default: `/user`)
//! - `GUARD_PUBLIC_PREFIXES` - Comma-separated prefixes that are never gated
//!   (default: `/static,/_next,/api,/health,/favicon.ico,/login,/register,/unauthorized`)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3001";
const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 5_000;

const DEFAULT_AUTH_PREFIXES: &[&str] = &["/evaluation", "/idea", "/user"];
const DEFAULT_ADMIN_PREFIXES: &[&str] = &["/admin"];
const DEFAULT_USER_PREFIXES: &[&str] = &["/user"];
const DEFAULT_PUBLIC_PREFIXES: &[&str] = &[
    "/static",
    "/_next",
    "/api",
    "/health",
    "/favicon.ico",
    "/login",
    "/register",
    "/unauthorized",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Gateway application configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Backend API base URL (session verifier, login, notifications)
    pub backend_url: Url,
    /// Page renderer base URL; requests that pass the guard are forwarded here
    pub frontend_url: Url,
    /// Upper bound on a session verification round trip
    pub verify_timeout: Duration,
    /// Path classification for the route guard
    pub guard: GuardConfig,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Path prefixes used by the route guard to classify requests.
///
/// Matching is plain `starts_with`, so `/admin` also covers `/administration`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Prefixes that require any authenticated session
    pub auth_prefixes: Vec<String>,
    /// Prefixes that require an admin role
    pub admin_prefixes: Vec<String>,
    /// Prefixes reserved to non-admin users
    pub user_prefixes: Vec<String>,
    /// Prefixes that are never gated (assets, API proxy, auth pages)
    pub public_prefixes: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            auth_prefixes: owned(DEFAULT_AUTH_PREFIXES),
            admin_prefixes: owned(DEFAULT_ADMIN_PREFIXES),
            user_prefixes: owned(DEFAULT_USER_PREFIXES),
            public_prefixes: owned(DEFAULT_PUBLIC_PREFIXES),
        }
    }
}

impl GuardConfig {
    fn from_source(get: &impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            auth_prefixes: get("GUARD_AUTH_PREFIXES")
                .map_or(defaults.auth_prefixes, |v| parse_prefix_list(&v)),
            admin_prefixes: get("GUARD_ADMIN_PREFIXES")
                .map_or(defaults.admin_prefixes, |v| parse_prefix_list(&v)),
            user_prefixes: get("GUARD_USER_PREFIXES")
                .map_or(defaults.user_prefixes, |v| parse_prefix_list(&v)),
            public_prefixes: get("GUARD_PUBLIC_PREFIXES")
                .map_or(defaults.public_prefixes, |v| parse_prefix_list(&v)),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but invalid.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get("GATEWAY_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_string())
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("GATEWAY_HOST".to_string(), e.to_string()))?;
        let port = get("GATEWAY_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("GATEWAY_PORT".to_string(), e.to_string()))?;
        let backend_url = parse_base_url(
            "BACKEND_URL",
            &get("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
        )?;
        let frontend_url = parse_base_url(
            "FRONTEND_URL",
            &get("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
        )?;
        let verify_timeout_ms = match get("VERIFY_TIMEOUT_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("VERIFY_TIMEOUT_MS".to_string(), e.to_string())
            })?,
            None => DEFAULT_VERIFY_TIMEOUT_MS,
        };

        Ok(Self {
            host,
            port,
            backend_url,
            frontend_url,
            verify_timeout: Duration::from_millis(verify_timeout_ms),
            guard: GuardConfig::from_source(&get),
            json_logs: get("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            sentry_dsn: get("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: get("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn owned(prefixes: &[&str]) -> Vec<String> {
    prefixes.iter().map(|p| (*p).to_string()).collect()
}

/// Split a comma-separated prefix list, dropping blanks and forcing a leading `/`.
fn parse_prefix_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.starts_with('/') {
                p.to_string()
            } else {
                format!("/{p}")
            }
        })
        .collect()
}

/// Parse an upstream base URL. Only `http`/`https` with a host are accepted.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected an http(s) URL with a host, got {raw}"),
        ));
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        GatewayConfig::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.backend_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.verify_timeout, Duration::from_secs(5));
        assert_eq!(config.guard, GuardConfig::default());
        assert!(!config.json_logs);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GATEWAY_PORT", "8080"),
            ("BACKEND_URL", "https://api.innov.example"),
            ("VERIFY_TIMEOUT_MS", "1500"),
            ("GUARD_ADMIN_PREFIXES", "/admin, backoffice ,"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.backend_url.host_str(), Some("api.innov.example"));
        assert_eq!(config.verify_timeout, Duration::from_millis(1500));
        assert_eq!(config.guard.admin_prefixes, vec!["/admin", "/backoffice"]);
        assert_eq!(config.guard.auth_prefixes, owned(DEFAULT_AUTH_PREFIXES));
        assert!(config.json_logs);
    }

    #[test]
    fn test_invalid_port() {
        let err = config_from(&[("GATEWAY_PORT", "seventy")]).unwrap_err();
        assert!(err.to_string().contains("GATEWAY_PORT"));
    }

    #[test]
    fn test_invalid_backend_url() {
        assert!(config_from(&[("BACKEND_URL", "localhost:5000")]).is_err());
        assert!(config_from(&[("BACKEND_URL", "ftp://files.example")]).is_err());
    }

    #[test]
    fn test_parse_prefix_list() {
        assert_eq!(parse_prefix_list(" /a,b , ,/c/d"), vec!["/a", "/b", "/c/d"]);
        assert!(parse_prefix_list(" , ").is_empty());
    }
}
