//! Client error types.

use thiserror::Error;

/// Generic message shown when the backend gives no usable reason.
pub const GENERIC_LOGIN_ERROR: &str = "Échec de la connexion. Veuillez réessayer.";

/// Message shown when the backend cannot be reached at all.
pub const UNREACHABLE_ERROR: &str = "Impossible de joindre le serveur.";

/// Errors returned by backend API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The session is missing or expired (HTTP 401).
    #[error("Unauthorized")]
    Unauthorized,

    /// The backend answered with a non-success status.
    #[error("API error: {status}{}", reason_suffix(.message))]
    Status {
        status: u16,
        /// The `message` or `error` field of the response body, if any.
        message: Option<String>,
    },

    /// The request did not complete (connection refused, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body was not what we expected.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the backend reported the session as invalid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Human-readable message suitable for a login form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Transport(_) => UNREACHABLE_ERROR.to_string(),
            Self::Unauthorized | Self::Status { message: None, .. } | Self::Decode(_) => {
                GENERIC_LOGIN_ERROR.to_string()
            }
        }
    }
}

#[allow(clippy::ref_option)]
fn reason_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" - {m}"))
        .unwrap_or_default()
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Errors raised by the push transport.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The push endpoint could not be reached or refused the upgrade.
    #[error("Connect failed: {0}")]
    Connect(String),

    /// The connection broke while reading.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request for the upgrade could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}
