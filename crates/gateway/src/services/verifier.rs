//! Session verification against the backend.
//!
//! The gateway never inspects session cookies itself. Every gated request is
//! verified by forwarding the caller's credentials to `GET /api/verify-token`
//! and trusting the identity the backend returns.

use std::time::Duration;

use axum::http::{
    HeaderMap, StatusCode,
    header::{AUTHORIZATION, COOKIE},
};
use innovation_portal_core::{Identity, IdentityEnvelope};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

/// Backend path of the session verifier.
pub const VERIFY_PATH: &str = "/api/verify-token";

/// Why a session could not be verified.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The backend answered with a non-success status (expired or missing session).
    #[error("session rejected with status {0}")]
    Rejected(StatusCode),

    /// The backend did not answer within the configured timeout.
    #[error("session verification timed out")]
    Timeout,

    /// The request could not be sent or the connection failed.
    #[error("session verification request failed: {0}")]
    Transport(String),

    /// The backend answered 2xx with a body that is not an identity.
    #[error("session verification returned an invalid body: {0}")]
    Decode(String),
}

impl VerifyError {
    /// Whether the failure means "not logged in" rather than "could not tell".
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Client for the backend session verifier.
#[derive(Debug, Clone)]
pub struct SessionVerifier {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl SessionVerifier {
    /// Create a verifier targeting `backend_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(backend_url: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let mut endpoint = backend_url.clone();
        endpoint.set_path(VERIFY_PATH);

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// The full verifier URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Verify the session carried by `headers`.
    ///
    /// Only the `Cookie` and `Authorization` headers are forwarded.
    ///
    /// # Errors
    ///
    /// See [`VerifyError`]; a timeout is reported as [`VerifyError::Timeout`].
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    pub async fn verify(&self, headers: &HeaderMap) -> Result<Identity, VerifyError> {
        let mut request = self.client.get(self.endpoint.clone()).timeout(self.timeout);
        for name in [COOKIE, AUTHORIZATION] {
            for value in headers.get_all(&name) {
                request = request.header(&name, value.clone());
            }
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                VerifyError::Timeout
            } else {
                VerifyError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Session rejected by backend");
            return Err(VerifyError::Rejected(status));
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                VerifyError::Timeout
            } else {
                VerifyError::Transport(e.to_string())
            }
        })?;

        let identity = serde_json::from_slice::<IdentityEnvelope>(&body)
            .map_err(|e| {
                warn!(error = %e, "Session verifier returned an unexpected body");
                VerifyError::Decode(e.to_string())
            })?
            .into_identity();

        debug!(user_id = %identity.id, role = %identity.role, "Session verified");
        Ok(identity)
    }

    /// Check that the backend answers at all, whatever the status.
    pub async fn ping(&self) -> bool {
        self.client
            .get(self.endpoint.clone())
            .timeout(self.timeout)
            .send()
            .await
            .is_ok()
    }
}
