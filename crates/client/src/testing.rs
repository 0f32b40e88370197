//! In-memory fakes shared by the unit tests.

use std::sync::{Arc, Mutex, PoisonError};

use innovation_portal_core::{
    Email, Identity, Notification, NotificationId, NotificationList, NotificationType, Role,
    UserId,
};
use secrecy::SecretString;

use crate::api::{NotificationApi, SessionApi};
use crate::error::ApiError;

pub fn identity(id: &str, role: &str) -> Identity {
    Identity {
        id: UserId::new(id),
        name: format!("user-{id}"),
        email: format!("user{id}@portal.example"),
        role: Role::new(role),
    }
}

pub fn notification(id: &str, is_read: bool) -> Notification {
    Notification {
        id: NotificationId::new(id),
        title: format!("Notification {id}"),
        message: String::new(),
        kind: NotificationType::Info,
        is_read,
        created_at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
        related_id: None,
    }
}

struct Script {
    verify: Result<Identity, ApiError>,
    login: Result<Identity, ApiError>,
    logout: Result<(), ApiError>,
    fetch: Result<NotificationList, ApiError>,
    mark_read: Result<(), ApiError>,
    mark_all_read: Result<(), ApiError>,
    login_calls: usize,
    fetch_calls: usize,
    marked: Vec<NotificationId>,
    mark_all_calls: usize,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            verify: Err(ApiError::Unauthorized),
            login: Err(ApiError::Unauthorized),
            logout: Ok(()),
            fetch: Ok(NotificationList::default()),
            mark_read: Ok(()),
            mark_all_read: Ok(()),
            login_calls: 0,
            fetch_calls: 0,
            marked: Vec::new(),
            mark_all_calls: 0,
        }
    }
}

/// Scripted backend; clones share the same script and call log.
#[derive(Clone, Default)]
pub struct FakeApi {
    script: Arc<Mutex<Script>>,
}

impl FakeApi {
    fn with<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        f(&mut self.script.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn set_verify(&self, result: Result<Identity, ApiError>) {
        self.with(|s| s.verify = result);
    }

    pub fn set_login(&self, result: Result<Identity, ApiError>) {
        self.with(|s| s.login = result);
    }

    pub fn set_logout(&self, result: Result<(), ApiError>) {
        self.with(|s| s.logout = result);
    }

    pub fn set_fetch(&self, result: Result<NotificationList, ApiError>) {
        self.with(|s| s.fetch = result);
    }

    pub fn set_mark_read(&self, result: Result<(), ApiError>) {
        self.with(|s| s.mark_read = result);
    }

    pub fn set_mark_all_read(&self, result: Result<(), ApiError>) {
        self.with(|s| s.mark_all_read = result);
    }

    pub fn login_calls(&self) -> usize {
        self.with(|s| s.login_calls)
    }

    pub fn fetch_calls(&self) -> usize {
        self.with(|s| s.fetch_calls)
    }

    pub fn marked(&self) -> Vec<NotificationId> {
        self.with(|s| s.marked.clone())
    }

    pub fn mark_all_calls(&self) -> usize {
        self.with(|s| s.mark_all_calls)
    }
}

impl SessionApi for FakeApi {
    async fn verify(&self) -> Result<Identity, ApiError> {
        self.with(|s| s.verify.clone())
    }

    async fn login(&self, _email: &Email, _password: &SecretString) -> Result<Identity, ApiError> {
        self.with(|s| {
            s.login_calls += 1;
            s.login.clone()
        })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.with(|s| s.logout.clone())
    }
}

impl NotificationApi for FakeApi {
    async fn fetch(&self) -> Result<NotificationList, ApiError> {
        self.with(|s| {
            s.fetch_calls += 1;
            s.fetch.clone()
        })
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        self.with(|s| {
            s.marked.push(id.clone());
            s.mark_read.clone()
        })
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.with(|s| {
            s.mark_all_calls += 1;
            s.mark_all_read.clone()
        })
    }
}
