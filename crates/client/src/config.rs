//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `PORTAL_BACKEND_URL` - Backend base URL (default: <http://localhost:5000>)
//! - `PORTAL_PUSH_URL` - Push endpoint (default: `ws://localhost:5000/ws/notifications`)
//! - `PORTAL_REQUEST_TIMEOUT_MS` - Per-request timeout (default: 5000)
//! - `PORTAL_CONNECT_DEBOUNCE_MS` - Delay before opening the push connection (default: 200)
//! - `PORTAL_EMAIL` - Login email used by the CLI
//! - `PORTAL_PASSWORD` - Login password used by the CLI

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::ConfigError;

const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
const DEFAULT_PUSH_URL: &str = "ws://localhost:5000/ws/notifications";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CONNECT_DEBOUNCE_MS: u64 = 200;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend REST base URL.
    pub backend_url: Url,
    /// WebSocket push endpoint.
    pub push_url: Url,
    /// Timeout applied to every REST call.
    pub request_timeout: Duration,
    /// Delay between an admin identity appearing and the push connection opening.
    pub connect_debounce: Duration,
    /// Stored login email.
    pub email: Option<String>,
    /// Stored login password.
    pub password: Option<SecretString>,
}

impl ClientConfig {
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
        let backend_url = parse_url(
            "PORTAL_BACKEND_URL",
            &get("PORTAL_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            &["http", "https"],
        )?;
        let push_url = parse_url(
            "PORTAL_PUSH_URL",
            &get("PORTAL_PUSH_URL").unwrap_or_else(|| DEFAULT_PUSH_URL.to_string()),
            &["ws", "wss"],
        )?;

        Ok(Self {
            backend_url,
            push_url,
            request_timeout: millis(&get, "PORTAL_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?,
            connect_debounce: millis(
                &get,
                "PORTAL_CONNECT_DEBOUNCE_MS",
                DEFAULT_CONNECT_DEBOUNCE_MS,
            )?,
            email: get("PORTAL_EMAIL").filter(|v| !v.trim().is_empty()),
            password: get("PORTAL_PASSWORD")
                .filter(|v| !v.is_empty())
                .map(SecretString::from),
        })
    }
}

fn millis(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let value = match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?,
        None => default,
    };
    Ok(Duration::from_millis(value))
}

fn parse_url(key: &str, raw: &str, schemes: &[&str]) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !schemes.contains(&url.scheme()) || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a {} URL with a host, got {raw}", schemes.join("/")),
        ));
    }

    Ok(url)
}
