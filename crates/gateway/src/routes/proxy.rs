//! Reverse-proxy handlers.
//!
//! `/api/*` goes to the backend untouched; every other path is a page and goes
//! to the renderer after the route guard has let it through.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    response::Response,
};

use crate::error::{AppError, Result};
use crate::middleware::route_guard::has_dot_segment;
use crate::services::Upstream;
use crate::state::AppState;

/// Largest request body the gateway buffers before forwarding.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Forward an API request to the backend.
pub async fn backend(State(state): State<AppState>, request: Request) -> Result<Response<Body>> {
    forward(state.backend(), request).await
}

/// Forward a page request to the renderer.
pub async fn frontend(State(state): State<AppState>, request: Request) -> Result<Response<Body>> {
    forward(state.frontend(), request).await
}

async fn forward(upstream: &Upstream, request: Request) -> Result<Response<Body>> {
    let (parts, body) = request.into_parts();
    // The upstream URL would resolve these; only forward the path as received.
    if has_dot_segment(parts.uri.path()) {
        return Err(AppError::BadRequest("path contains dot segments".to_string()));
    }

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("request body rejected: {e}")))?;

    let response = upstream
        .forward(parts.method, &parts.uri, &parts.headers, body)
        .await?;
    Ok(response)
}
