//! Outbound services used by the gateway.
//!
//! # Services
//!
//! - [`verifier`] - Session verification round trip (`GET /api/verify-token`)
//! - [`upstream`] - Request forwarding to the backend API and the page renderer

pub mod upstream;
pub mod verifier;

pub use upstream::{ProxyError, Upstream};
pub use verifier::{SessionVerifier, VerifyError};
