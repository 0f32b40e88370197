//! Innovation Portal Core - Shared types library.
//!
//! This crate provides common types used across all portal components:
//! - `gateway` - Request-time route guard and reverse proxy
//! - `client` - Session context and admin notification pipeline
//! - `cli` - Command-line access to the notification backlog
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Role
//! derivation lives here so the gateway and the client can never disagree on
//! who counts as an admin.
//!
//! # Modules
//!
//! - [`types`] - Identities, roles, notifications and push payloads
//! - [`paths`] - Well-known page paths used for redirects and navigation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod paths;
pub mod types;

pub use types::*;
