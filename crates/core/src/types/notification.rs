//! Admin notifications: backlog entries and pushed events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::id::{NotificationId, deserialize_flexible_opt};
use super::timestamp::{deserialize_timestamp_opt, deserialize_timestamp_or_epoch, unix_epoch};

/// Name of the push event carrying a new notification.
pub const NEW_NOTIFICATION_EVENT: &str = "new_notification";

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationType {
    /// Parse a type string, falling back to `Info` for anything unknown.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "success" => Self::Success,
            "warning" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse_lenient).unwrap_or_default())
    }
}

/// A notification as held in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    #[serde(default)]
    pub is_read: bool,
    /// The Unix epoch when the backend sent no usable timestamp.
    #[serde(default = "unix_epoch", deserialize_with = "deserialize_timestamp_or_epoch")]
    pub created_at: DateTime<Utc>,
    /// Entity the notification refers to, when known.
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub related_id: Option<String>,
}

/// Response body of `GET /api/notifications`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationList {
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub unread_count: Option<usize>,
}

impl NotificationList {
    /// The unread count reported by the backend, or the count of unread
    /// entries when the backend omitted it.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.unread_count
            .unwrap_or_else(|| self.notifications.iter().filter(|n| !n.is_read).count())
    }
}

/// Payload of a `new_notification` push event.
///
/// Different producers on the backend identify the related entity under
/// different keys; see [`PushedNotification::related_id`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushedNotification {
    pub id: NotificationId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    #[serde(default, deserialize_with = "deserialize_timestamp_opt")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_flexible_opt")]
    pub related_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_opt")]
    pub idea_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_opt")]
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_opt")]
    pub evaluation_id: Option<String>,
}

impl PushedNotification {
    /// The related entity id: first present of `related_id`, `idea_id`,
    /// `project_id`, `evaluation_id`.
    #[must_use]
    pub fn related_id(&self) -> Option<&str> {
        [
            &self.related_id,
            &self.idea_id,
            &self.project_id,
            &self.evaluation_id,
        ]
        .into_iter()
        .find_map(Option::as_deref)
    }

    /// Convert into an unread store entry.
    ///
    /// `received_at` is used when the producer did not send a timestamp.
    #[must_use]
    pub fn into_notification(self, received_at: DateTime<Utc>) -> Notification {
        let related_id = self.related_id().map(str::to_owned);
        Notification {
            id: self.id,
            title: self.title,
            message: self.message,
            kind: self.kind,
            is_read: false,
            created_at: self.timestamp.unwrap_or(received_at),
            related_id,
        }
    }
}

/// A frame received on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl PushFrame {
    /// Build a `new_notification` frame.
    #[must_use]
    pub fn new_notification(data: serde_json::Value) -> Self {
        Self {
            event: NEW_NOTIFICATION_EVENT.to_owned(),
            data,
        }
    }
}
