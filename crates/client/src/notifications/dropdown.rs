//! Bell-menu view over the notification store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use innovation_portal_core::{Notification, NotificationId, paths};
use tracing::debug;

use super::routing;
use super::store::NotificationStore;
use crate::api::NotificationApi;
use crate::navigation::Navigator;

/// Most entries shown in the dropdown.
pub const DROPDOWN_LIMIT: usize = 10;

/// What the dropdown renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownView {
    pub is_open: bool,
    pub unread_count: usize,
    /// At most [`DROPDOWN_LIMIT`] entries, most recent first.
    pub items: Vec<Notification>,
    /// Link to the full listing, present when entries were left out.
    pub see_all: Option<&'static str>,
}

pub struct NotificationDropdown<A, N> {
    store: Arc<NotificationStore<A>>,
    navigator: N,
    open: AtomicBool,
}

impl<A: NotificationApi, N: Navigator> NotificationDropdown<A, N> {
    pub const fn new(store: Arc<NotificationStore<A>>, navigator: N) -> Self {
        Self {
            store,
            navigator,
            open: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::Release);
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    pub fn toggle(&self) {
        self.open.fetch_xor(true, Ordering::AcqRel);
    }

    #[must_use]
    pub fn view(&self) -> DropdownView {
        let snapshot = self.store.snapshot();
        let has_more = snapshot.notifications.len() > DROPDOWN_LIMIT;

        DropdownView {
            is_open: self.is_open(),
            unread_count: snapshot.unread_count,
            items: snapshot
                .notifications
                .into_iter()
                .take(DROPDOWN_LIMIT)
                .collect(),
            see_all: has_more.then_some(paths::NOTIFICATIONS_LISTING),
        }
    }

    /// Handle a click on one entry.
    ///
    /// Unread entries are marked read before navigating. The dropdown closes
    /// whether or not the click leads anywhere. Returns the destination.
    pub async fn click(&self, id: &NotificationId) -> Option<String> {
        let Some(notification) = self.store.get(id) else {
            debug!(notification_id = %id, "Clicked notification is gone");
            self.close();
            return None;
        };

        if !notification.is_read {
            self.store.mark_as_read(id).await;
        }

        let target = routing::destination(&notification);
        if let Some(target) = &target {
            self.navigator.navigate(target);
        }
        self.close();
        target
    }

    /// "Mark all as read" button.
    pub async fn mark_all_as_read(&self) {
        self.store.mark_all_as_read().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::RecordingNavigator;
    use crate::testing::{FakeApi, notification};

    fn dropdown(
        count: usize,
    ) -> (
        NotificationDropdown<FakeApi, RecordingNavigator>,
        Arc<NotificationStore<FakeApi>>,
        FakeApi,
        RecordingNavigator,
    ) {
        let api = FakeApi::default();
        let store = Arc::new(NotificationStore::new(Arc::new(api.clone())));
        for i in 0..count {
            store.push(notification(&i.to_string(), false));
        }
        let navigator = RecordingNavigator::new();
        let dropdown = NotificationDropdown::new(Arc::clone(&store), navigator.clone());
        (dropdown, store, api, navigator)
    }

    #[test]
    fn test_view_caps_entries() {
        let (dropdown, _, _, _) = dropdown(12);
        let view = dropdown.view();

        assert_eq!(view.items.len(), DROPDOWN_LIMIT);
        assert_eq!(view.items.first().map(|n| n.id.as_str()), Some("11"));
        assert_eq!(view.unread_count, 12);
        assert_eq!(view.see_all, Some("/admin/notifications"));
    }

    #[test]
    fn test_view_without_overflow() {
        let (dropdown, _, _, _) = dropdown(10);
        let view = dropdown.view();

        assert_eq!(view.items.len(), 10);
        assert_eq!(view.see_all, None);
    }

    #[test]
    fn test_toggle() {
        let (dropdown, _, _, _) = dropdown(0);
        assert!(!dropdown.is_open());
        dropdown.toggle();
        assert!(dropdown.view().is_open);
        dropdown.toggle();
        assert!(!dropdown.is_open());
    }

    #[tokio::test]
    async fn test_click_marks_read_navigates_and_closes() {
        let (dropdown, store, api, navigator) = dropdown(0);
        let mut pushed = notification("7", false);
        pushed.title = "Nouvelle idée".to_string();
        pushed.message = "X a soumis une nouvelle idée : 'Idea Title'".to_string();
        pushed.related_id = Some("42".to_string());
        store.push(pushed);
        dropdown.open();

        let target = dropdown.click(&NotificationId::new("7")).await;

        assert_eq!(target.as_deref(), Some("/admin/idea?search=Idea%20Title"));
        assert_eq!(navigator.history(), vec!["/admin/idea?search=Idea%20Title"]);
        assert_eq!(api.marked(), vec![NotificationId::new("7")]);
        assert_eq!(store.unread_count(), 0);
        assert!(!dropdown.is_open());
    }

    #[tokio::test]
    async fn test_click_read_entry_skips_backend() {
        let (dropdown, store, api, navigator) = dropdown(0);
        store.push(notification("1", true));
        dropdown.open();

        assert_eq!(dropdown.click(&NotificationId::new("1")).await, None);
        assert!(api.marked().is_empty());
        assert!(navigator.history().is_empty());
        assert!(!dropdown.is_open());
    }
}
