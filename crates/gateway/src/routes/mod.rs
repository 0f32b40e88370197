//! HTTP routes for the gateway.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health          - Liveness
//! GET  /health/ready    - Readiness (backend reachable)
//! ANY  /api/{*rest}     - Backend API, not guarded
//! ANY  /{*rest}         - Page renderer, behind the route guard
//! ```

pub mod health;
pub mod proxy;

use axum::{
    Router, middleware,
    routing::{any, get},
};

use crate::middleware::{
    request_id_middleware, route_guard_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Build the full gateway router.
///
/// Sentry and tracing layers are added by the binary so tests can drive this
/// router with `oneshot` directly.
pub fn routes(state: AppState) -> Router {
    let pages = Router::new()
        .fallback(proxy::frontend)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            route_guard_middleware,
        ))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api", any(proxy::backend))
        .route("/api/{*rest}", any(proxy::backend))
        .fallback_service(pages)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
