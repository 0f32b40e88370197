//! User role as reported by the backend.
//!
//! The backend sends roles as free-form strings (`"Admin"`, `"super_admin"`,
//! `"user"`, `"evaluateur"`...). Membership is decided by substring containment
//! on the normalized value, so `"super_admin"` counts as an admin and
//! `"power-user"` counts as a user.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

const ADMIN_MARKER: &str = "admin";
const USER_MARKER: &str = "user";

/// A normalized (trimmed, lower-cased) role string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Normalize a raw role string.
    ///
    /// ```
    /// use innovation_portal_core::Role;
    ///
    /// assert_eq!(Role::new("  Admin ").as_str(), "admin");
    /// ```
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Returns the normalized role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the role contains `"admin"`.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0.contains(ADMIN_MARKER)
    }

    /// Whether the role contains `"user"`.
    ///
    /// Note that this does not exclude admins; use [`Role::is_admin`] first
    /// when the distinction matters.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.0.contains(USER_MARKER)
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|r| Self::new(&r)).unwrap_or_default())
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
