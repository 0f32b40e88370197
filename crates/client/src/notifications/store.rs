//! In-memory notification state for the admin session.
//!
//! Mutations are applied locally first and then sent to the backend. The
//! unread count is recomputed from the list after every local mutation, so it
//! always matches the entries and cannot underflow, however requests overlap.
//! A successful fetch replaces the whole state with the backend's view.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use innovation_portal_core::{Identity, Notification, NotificationId, NotificationList};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::api::NotificationApi;
use crate::error::ApiError;

/// Point-in-time copy of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Most recent first.
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

impl StoreSnapshot {
    fn reconcile(&mut self) {
        self.unread_count = self.notifications.iter().filter(|n| !n.is_read).count();
    }
}

/// Notification list and unread badge, synchronised with the backend.
pub struct NotificationStore<A> {
    api: Arc<A>,
    state: Mutex<StoreSnapshot>,
    unread: watch::Sender<usize>,
}

impl<A: NotificationApi> NotificationStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (unread, _) = watch::channel(0);
        Self {
            api,
            state: Mutex::new(StoreSnapshot::default()),
            unread,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().clone()
    }

    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.lock().unread_count
    }

    #[must_use]
    pub fn get(&self, id: &NotificationId) -> Option<Notification> {
        self.lock().notifications.iter().find(|n| &n.id == id).cloned()
    }

    /// Observe the unread badge.
    #[must_use]
    pub fn subscribe_unread(&self) -> watch::Receiver<usize> {
        self.unread.subscribe()
    }

    /// Load the backlog for `identity`.
    ///
    /// Non-admin or absent identities get an empty store without a request.
    /// Any failure also empties the store rather than leaving stale entries.
    #[instrument(skip_all)]
    pub async fn fetch(&self, identity: Option<&Identity>) {
        if !identity.is_some_and(Identity::is_admin) {
            self.clear();
            return;
        }

        match self.api.fetch().await {
            Ok(list) => {
                debug!(count = list.notifications.len(), "Notification backlog loaded");
                self.replace(list);
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch notifications");
                self.clear();
            }
        }
    }

    /// Mark one notification as read, locally first.
    #[instrument(skip(self), fields(notification_id = %id))]
    pub async fn mark_as_read(&self, id: &NotificationId) {
        self.update(|state| {
            if let Some(entry) = state.notifications.iter_mut().find(|n| &n.id == id) {
                entry.is_read = true;
            }
        });

        if let Err(e) = self.api.mark_read(id).await {
            self.on_mutation_error(&e);
        }
    }

    /// Mark every notification as read, locally first.
    #[instrument(skip(self))]
    pub async fn mark_all_as_read(&self) {
        self.update(|state| {
            for entry in &mut state.notifications {
                entry.is_read = true;
            }
        });

        if let Err(e) = self.api.mark_all_read().await {
            self.on_mutation_error(&e);
        }
    }

    /// Add a pushed notification at the front.
    ///
    /// An entry with the same id is replaced rather than duplicated.
    pub fn push(&self, notification: Notification) {
        self.update(|state| {
            state.notifications.retain(|n| n.id != notification.id);
            state.notifications.insert(0, notification);
        });
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.update(|state| state.notifications.clear());
    }

    fn replace(&self, list: NotificationList) {
        let unread_count = list.unread_count();
        let mut state = self.lock();
        *state = StoreSnapshot {
            notifications: list.notifications,
            unread_count,
        };
        self.unread.send_replace(unread_count);
    }

    fn on_mutation_error(&self, error: &ApiError) {
        if error.is_unauthorized() {
            warn!("Session expired, clearing notifications");
            self.clear();
        } else {
            // Local state stays authoritative until the next fetch.
            warn!(error = %error, "Failed to sync notification state");
        }
    }

    fn update(&self, mutate: impl FnOnce(&mut StoreSnapshot)) {
        let mut state = self.lock();
        mutate(&mut state);
        state.reconcile();
        self.unread.send_replace(state.unread_count);
    }

    fn lock(&self) -> MutexGuard<'_, StoreSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, identity, notification};

    fn store_with(entries: Vec<Notification>) -> (NotificationStore<FakeApi>, FakeApi) {
        let api = FakeApi::default();
        let store = NotificationStore::new(Arc::new(api.clone()));
        for entry in entries.into_iter().rev() {
            store.push(entry);
        }
        (store, api)
    }

    fn id(raw: &str) -> NotificationId {
        NotificationId::new(raw)
    }

    #[test]
    fn test_push_prepends_and_counts() {
        let (store, _) = store_with(vec![notification("1", true)]);
        store.push(notification("2", false));

        let ids: Vec<_> = store.notifications().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![id("2"), id("1")]);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_push_replaces_duplicate_id() {
        let (store, _) = store_with(vec![notification("1", false), notification("2", false)]);
        let mut updated = notification("2", false);
        updated.title = "Updated".to_string();
        store.push(updated);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.notifications.len(), 2);
        assert_eq!(snapshot.notifications[0].title, "Updated");
        assert_eq!(snapshot.unread_count, 2);
    }

    #[tokio::test]
    async fn test_mark_as_read_is_idempotent() {
        let (store, api) = store_with(vec![notification("1", false), notification("2", false)]);

        store.mark_as_read(&id("1")).await;
        store.mark_as_read(&id("1")).await;

        assert_eq!(store.unread_count(), 1);
        assert!(store.get(&id("1")).is_some_and(|n| n.is_read));
        assert_eq!(api.marked(), vec![id("1"), id("1")]);
    }

    #[tokio::test]
    async fn test_unread_count_never_underflows() {
        let (store, api) = store_with(vec![notification("1", false)]);

        store.mark_all_as_read().await;
        store.mark_as_read(&id("1")).await;
        store.mark_as_read(&id("missing")).await;
        store.mark_all_as_read().await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.unread_count, 0);
        assert_eq!(
            snapshot.unread_count,
            snapshot.notifications.iter().filter(|n| !n.is_read).count()
        );
        assert_eq!(api.mark_all_calls(), 2);
    }

    #[tokio::test]
    async fn test_mark_error_keeps_optimistic_state() {
        let (store, api) = store_with(vec![notification("1", false)]);
        api.set_mark_read(Err(ApiError::Transport("refused".into())));

        store.mark_as_read(&id("1")).await;

        assert_eq!(store.unread_count(), 0);
        assert_eq!(store.notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_clears_everything() {
        let (store, api) = store_with(vec![notification("1", false), notification("2", false)]);
        api.set_mark_all_read(Err(ApiError::Unauthorized));

        store.mark_all_as_read().await;
        assert_eq!(store.snapshot(), StoreSnapshot::default());

        store.push(notification("3", false));
        api.set_mark_read(Err(ApiError::Unauthorized));
        store.mark_as_read(&id("3")).await;
        assert_eq!(store.snapshot(), StoreSnapshot::default());
    }

    #[tokio::test]
    async fn test_fetch_replaces_state() {
        let (store, api) = store_with(vec![notification("old", false)]);
        api.set_fetch(Ok(NotificationList {
            notifications: vec![notification("1", false), notification("2", true)],
            unread_count: Some(1),
        }));

        store.fetch(Some(&identity("9", "admin"))).await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.notifications.len(), 2);
        assert_eq!(snapshot.unread_count, 1);
        assert_eq!(*store.subscribe_unread().borrow(), 1);
    }

    #[tokio::test]
    async fn test_fetch_errors_clear_state() {
        for error in [
            ApiError::Unauthorized,
            ApiError::Transport("refused".into()),
            ApiError::Decode("eof".into()),
        ] {
            let (store, api) = store_with(vec![notification("1", false)]);
            api.set_fetch(Err(error));

            store.fetch(Some(&identity("9", "admin"))).await;
            assert_eq!(store.snapshot(), StoreSnapshot::default());
        }
    }

    #[tokio::test]
    async fn test_fetch_skipped_for_non_admin() {
        let (store, api) = store_with(vec![notification("1", false)]);

        store.fetch(Some(&identity("2", "user"))).await;
        store.fetch(None).await;

        assert_eq!(api.fetch_calls(), 0);
        assert_eq!(store.snapshot(), StoreSnapshot::default());
    }
}
