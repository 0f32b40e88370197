//! Backend API access.
//!
//! [`SessionApi`] and [`NotificationApi`] are the seams the rest of the crate
//! talks through; [`BackendClient`] implements both over HTTP with a cookie
//! jar, so the session cookie set by `POST /api/login` rides along on every
//! later call and can be handed to the push transport.

use std::future::Future;
use std::sync::Arc;

use innovation_portal_core::{Email, Identity, IdentityEnvelope, NotificationId, NotificationList};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Session verification endpoint.
pub const VERIFY_PATH: &str = "/api/verify-token";
/// Credential exchange endpoint.
pub const LOGIN_PATH: &str = "/api/login";
/// Session termination endpoint.
pub const LOGOUT_PATH: &str = "/logout";
/// Notification backlog endpoint.
pub const NOTIFICATIONS_PATH: &str = "/api/notifications";

/// Session operations against the backend.
pub trait SessionApi: Send + Sync {
    /// Verify the current session and return its identity.
    fn verify(&self) -> impl Future<Output = Result<Identity, ApiError>> + Send;

    /// Exchange credentials for a session.
    fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<Identity, ApiError>> + Send;

    /// End the current session.
    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Notification operations against the backend.
pub trait NotificationApi: Send + Sync {
    /// Fetch the notification backlog.
    fn fetch(&self) -> impl Future<Output = Result<NotificationList, ApiError>> + Send;

    /// Mark one notification as read.
    fn mark_read(&self, id: &NotificationId)
    -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Mark every notification as read.
    fn mark_all_read(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// HTTP implementation of the backend API.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base: Url,
    cookies: Arc<Jar>,
}

impl BackendClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let cookies = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base: config.backend_url.clone(),
            cookies,
        })
    }

    /// Backend base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// `Cookie` header value for the backend origin, if a session is stored.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        self.cookies
            .cookies(&self.base)
            .and_then(|value| value.to_str().ok().map(String::from))
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(None);
        url
    }

    /// Turn a non-success response into an `ApiError`, keeping 401 distinct.
    async fn ensure_success(response: Response) -> Result<Response, ApiError> {
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(response)
    }
}

/// Build `ApiError::Status` from a failed response, keeping the backend's reason.
async fn status_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message.or(body.error))
        .filter(|m| !m.trim().is_empty());

    ApiError::Status { status, message }
}

impl SessionApi for BackendClient {
    #[instrument(skip(self))]
    async fn verify(&self) -> Result<Identity, ApiError> {
        let response = self.client.get(self.endpoint(VERIFY_PATH)).send().await?;
        let response = Self::ensure_success(response).await?;

        let envelope: IdentityEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(envelope.into_identity())
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &Email, password: &SecretString) -> Result<Identity, ApiError> {
        let body = LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let response = self
            .client
            .post(self.endpoint(LOGIN_PATH))
            .json(&body)
            .send()
            .await?;

        // A rejected login is a form error, not an expired session.
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let bytes = response.bytes().await?;
        match serde_json::from_slice::<IdentityEnvelope>(&bytes) {
            Ok(envelope) => Ok(envelope.into_identity()),
            Err(e) => {
                debug!(error = %e, "Login response carries no identity, verifying session");
                self.verify().await
            }
        }
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<(), ApiError> {
        let response = self.client.post(self.endpoint(LOGOUT_PATH)).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

impl NotificationApi for BackendClient {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<NotificationList, ApiError> {
        let response = self
            .client
            .get(self.endpoint(NOTIFICATIONS_PATH))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    #[instrument(skip(self), fields(notification_id = %id))]
    async fn mark_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        let path = format!(
            "{NOTIFICATIONS_PATH}/{}/read",
            urlencoding::encode(id.as_str())
        );
        let response = self.client.put(self.endpoint(&path)).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self) -> Result<(), ApiError> {
        let path = format!("{NOTIFICATIONS_PATH}/read-all");
        let response = self.client.put(self.endpoint(&path)).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        let config = ClientConfig::from_source(|key| {
            (key == "PORTAL_BACKEND_URL").then(|| base.to_string())
        })
        .unwrap();
        BackendClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_replaces_base_path() {
        let client = client("http://localhost:5000/ignored?x=1");
        assert_eq!(
            client.endpoint(NOTIFICATIONS_PATH).as_str(),
            "http://localhost:5000/api/notifications"
        );
        assert_eq!(client.endpoint(LOGOUT_PATH).as_str(), "http://localhost:5000/logout");
    }

    #[test]
    fn test_no_cookie_before_login() {
        assert!(client("http://localhost:5000").cookie_header().is_none());
    }
}
