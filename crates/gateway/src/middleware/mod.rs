//! HTTP middleware stack for the gateway.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (reuse or generate, forwarded upstream)
//! 4. Security headers (fill in what the upstream left out)
//! 5. Route guard (page requests only; `/api` and `/health` bypass it)

pub mod request_id;
pub mod route_guard;
pub mod security_headers;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use route_guard::{GuardDecision, RouteGuard, route_guard_middleware};
pub use security_headers::security_headers_middleware;
