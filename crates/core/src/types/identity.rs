//! Authenticated identity returned by the session verifier and login endpoint.

use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::role::Role;

/// The currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    /// Display name. Some backend endpoints call this `username`.
    #[serde(alias = "username", default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl Identity {
    /// Whether this identity may access admin pages and notifications.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Response body of `GET /api/verify-token` and `POST /api/login`.
///
/// Depending on the endpoint the identity is either the body itself or
/// nested under `user`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdentityEnvelope {
    Wrapped { user: Identity },
    Bare(Identity),
}

impl IdentityEnvelope {
    /// Unwrap the identity regardless of the envelope shape.
    #[must_use]
    pub fn into_identity(self) -> Identity {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}
