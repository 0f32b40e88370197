//! CLI command implementations.

pub mod notifications;
pub mod session;

use std::sync::Arc;

use innovation_portal_client::{
    ApiError, AuthContext, BackendClient, ClientConfig, ConfigError, Navigator,
};
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend call failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Email or password missing.
    #[error("Missing credentials: set --email/PORTAL_EMAIL and PORTAL_PASSWORD")]
    MissingCredentials,

    /// The backend refused the credentials.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// The command needs an administrator session.
    #[error("Notifications are only available to administrators")]
    NotAdmin,

    /// No notification with that ID in the backlog.
    #[error("Notification not found: {0}")]
    NotFound(String),
}

/// Logs navigation instead of performing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, target: &str) {
        tracing::info!(%target, "Navigate");
    }
}

/// Backend connection shared by all commands of one invocation.
pub struct Session {
    pub config: ClientConfig,
    pub backend: Arc<BackendClient>,
    pub auth: AuthContext<BackendClient, LogNavigator>,
    email: Option<String>,
}

impl Session {
    /// Load configuration and build the clients. Does not log in yet.
    pub fn open(email: Option<String>) -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let backend = Arc::new(BackendClient::new(&config)?);
        let auth = AuthContext::new(Arc::clone(&backend), LogNavigator);
        tracing::debug!(backend = %config.backend_url, "Client configured");

        Ok(Self {
            email: email.or_else(|| config.email.clone()),
            config,
            backend,
            auth,
        })
    }

    /// Log in with the configured credentials unless already logged in.
    pub async fn ensure_login(&self, callback_url: Option<&str>) -> Result<(), CliError> {
        if self.auth.identity().is_some() {
            return Ok(());
        }

        let email = self.email.as_deref().ok_or(CliError::MissingCredentials)?;
        let password: &SecretString = self
            .config
            .password
            .as_ref()
            .ok_or(CliError::MissingCredentials)?;

        if self.auth.login(email, password, callback_url).await {
            Ok(())
        } else {
            Err(CliError::LoginFailed(
                self.auth.last_error().unwrap_or_default(),
            ))
        }
    }
}
