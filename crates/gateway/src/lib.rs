//! Innovation portal gateway library.
//!
//! The gateway sits in front of the page renderer. It applies the route guard
//! to page requests, forwards `/api` traffic to the backend, and exposes
//! health endpoints. Exposed as a library so the router can be driven from
//! tests without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ConfigError, GatewayConfig, GuardConfig};
pub use routes::routes;
pub use state::AppState;
