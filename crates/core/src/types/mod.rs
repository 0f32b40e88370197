//! Core types for the innovation portal.
//!
//! This module provides type-safe wrappers for identities, roles and
//! notifications exchanged with the backend.

pub mod email;
pub mod id;
pub mod identity;
pub mod notification;
pub mod role;
pub mod timestamp;

pub use email::{Email, EmailError};
pub use id::{NotificationId, RawId, UserId};
pub use identity::{Identity, IdentityEnvelope};
pub use notification::{
    NEW_NOTIFICATION_EVENT, Notification, NotificationList, NotificationType, PushFrame,
    PushedNotification,
};
pub use role::Role;
pub use timestamp::parse_timestamp;
