//! Application state shared across handlers and middleware.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::middleware::route_guard::RouteGuard;
use crate::services::{SessionVerifier, Upstream};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configured upstreams and the route guard.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GatewayConfig,
    guard: RouteGuard,
    verifier: SessionVerifier,
    backend: Upstream,
    frontend: Upstream,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let verifier = SessionVerifier::new(&config.backend_url, config.verify_timeout)?;
        let backend = Upstream::new("backend", config.backend_url.clone())?;
        let frontend = Upstream::new("frontend", config.frontend_url.clone())?;
        let guard = RouteGuard::new(config.guard.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                guard,
                verifier,
                backend,
                frontend,
            }),
        })
    }

    /// Get a reference to the gateway configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Get a reference to the route guard.
    #[must_use]
    pub fn guard(&self) -> &RouteGuard {
        &self.inner.guard
    }

    /// Get a reference to the session verifier.
    #[must_use]
    pub fn verifier(&self) -> &SessionVerifier {
        &self.inner.verifier
    }

    /// Get a reference to the backend API upstream.
    #[must_use]
    pub fn backend(&self) -> &Upstream {
        &self.inner.backend
    }

    /// Get a reference to the page renderer upstream.
    #[must_use]
    pub fn frontend(&self) -> &Upstream {
        &self.inner.frontend
    }
}
