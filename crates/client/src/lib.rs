//! Innovation portal client.
//!
//! Client-side half of the portal's access and notification subsystem:
//!
//! - [`auth::AuthContext`] holds the current identity and performs login,
//!   logout and hydration against the backend.
//! - [`notifications::NotificationChannel`] keeps a push connection open while
//!   the identity is an administrator and feeds a
//!   [`notifications::NotificationStore`].
//! - [`notifications::NotificationDropdown`] is the bell-menu view over the
//!   store, including click routing.
//!
//! Everything talks to the backend through the [`api`] traits, so tests and
//! alternative front-ends can substitute their own implementations.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod navigation;
pub mod notifications;

#[cfg(test)]
mod testing;

pub use api::{BackendClient, NotificationApi, SessionApi};
pub use auth::AuthContext;
pub use config::ClientConfig;
pub use error::{ApiError, ChannelError, ConfigError};
pub use navigation::{Navigator, RecordingNavigator};
