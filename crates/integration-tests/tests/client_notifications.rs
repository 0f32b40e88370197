//! Integration tests for the client against the mock backend.
//!
//! Covers the login round trip through the cookie jar, the notification store
//! talking to the real REST endpoints, and pushes arriving over a WebSocket.

#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use innovation_portal_client::notifications::{
    ChannelState, NoopNotifier, NotificationChannel, NotificationStore, WebSocketTransport,
};
use innovation_portal_client::{
    ApiError, AuthContext, BackendClient, RecordingNavigator, SessionApi,
};
use innovation_portal_core::{NotificationId, PushFrame};
use innovation_portal_integration_tests::{
    ADMIN_EMAIL, BAD_CREDENTIALS, MockBackend, PASSWORD, USER_EMAIL, WAIT, notification_json,
};
use secrecy::SecretString;
use serde_json::json;
use tokio::sync::watch;

type Auth = AuthContext<BackendClient, RecordingNavigator>;

struct Session {
    backend: MockBackend,
    client: Arc<BackendClient>,
    auth: Auth,
    navigator: RecordingNavigator,
}

async fn session() -> Session {
    let backend = MockBackend::start().await;
    let client = Arc::new(BackendClient::new(&backend.client_config()).expect("client"));
    let navigator = RecordingNavigator::new();
    let auth = AuthContext::new(Arc::clone(&client), navigator.clone());

    Session {
        backend,
        client,
        auth,
        navigator,
    }
}

fn password() -> SecretString {
    SecretString::from(PASSWORD)
}

async fn wait_for<T>(rx: &mut watch::Receiver<T>, mut predicate: impl FnMut(&T) -> bool) {
    tokio::time::timeout(WAIT, rx.wait_for(|value| predicate(value)))
        .await
        .expect("Timed out waiting for state")
        .map(drop)
        .expect("Sender dropped");
}

// =============================================================================
// Auth context
// =============================================================================

#[tokio::test]
async fn test_admin_login_lands_on_admin_projects() {
    let s = session().await;

    assert!(s.auth.login(ADMIN_EMAIL, &password(), None).await);

    assert!(s.auth.is_admin());
    assert_eq!(s.navigator.last().as_deref(), Some("/admin/project"));
    assert!(s.client.cookie_header().is_some());
}

#[tokio::test]
async fn test_login_follows_local_callback() {
    let s = session().await;

    assert!(s.auth.login(USER_EMAIL, &password(), Some("/idea/3?tab=info")).await);

    assert!(!s.auth.is_admin());
    assert_eq!(s.navigator.last().as_deref(), Some("/idea/3?tab=info"));
}

#[tokio::test]
async fn test_rejected_login_reports_backend_message() {
    let s = session().await;

    let secret = SecretString::from("wrong");
    assert!(!s.auth.login(ADMIN_EMAIL, &secret, None).await);

    assert_eq!(s.auth.identity(), None);
    assert_eq!(s.auth.last_error().as_deref(), Some(BAD_CREDENTIALS));
    assert!(s.navigator.history().is_empty());
}

#[tokio::test]
async fn test_hydrate_restores_identity_from_cookie() {
    let s = session().await;
    assert!(s.auth.login(ADMIN_EMAIL, &password(), None).await);

    // A fresh context sharing the cookie jar, as after a page reload.
    let reloaded: Auth = AuthContext::new(Arc::clone(&s.client), RecordingNavigator::new());
    let identity = reloaded.hydrate().await.expect("session restored");

    assert_eq!(identity.email, ADMIN_EMAIL);
    assert_eq!(identity.name, "Alice Admin");
    assert!(reloaded.is_admin());
}

#[tokio::test]
async fn test_logout_ends_backend_session() {
    let s = session().await;
    assert!(s.auth.login(ADMIN_EMAIL, &password(), None).await);

    s.auth.logout().await;

    assert_eq!(s.auth.identity(), None);
    assert_eq!(s.navigator.last().as_deref(), Some("/"));
    assert!(matches!(s.client.verify().await, Err(ApiError::Unauthorized)));
    assert_eq!(s.auth.hydrate().await, None);
}

// =============================================================================
// Notification store
// =============================================================================

#[tokio::test]
async fn test_store_syncs_with_backend() {
    let s = session().await;
    s.backend.set_notifications(vec![
        notification_json(2, "Nouvelle idée", "", false),
        notification_json(1, "Bienvenue", "", false),
    ]);
    assert!(s.auth.login(ADMIN_EMAIL, &password(), None).await);
    let store = NotificationStore::new(Arc::clone(&s.client));

    store.fetch(s.auth.identity().as_ref()).await;
    assert_eq!(store.notifications().len(), 2);
    assert_eq!(store.unread_count(), 2);

    store.mark_as_read(&NotificationId::new("1")).await;
    assert_eq!(store.unread_count(), 1);
    assert_eq!(s.backend.marked(), vec!["1".to_string()]);
    assert!(s.backend.is_read("1"));

    store.mark_all_as_read().await;
    assert_eq!(store.unread_count(), 0);
    assert_eq!(s.backend.mark_all_calls(), 1);

    store.fetch(s.auth.identity().as_ref()).await;
    assert_eq!(store.unread_count(), 0);
}

#[tokio::test]
async fn test_expired_session_empties_store() {
    let s = session().await;
    s.backend
        .set_notifications(vec![notification_json(1, "Bienvenue", "", false)]);
    assert!(s.auth.login(ADMIN_EMAIL, &password(), None).await);
    let store = NotificationStore::new(Arc::clone(&s.client));
    store.fetch(s.auth.identity().as_ref()).await;
    assert_eq!(store.notifications().len(), 1);

    s.backend.expire_sessions();
    store.mark_all_as_read().await;

    assert!(store.notifications().is_empty());
    assert_eq!(store.unread_count(), 0);
}

#[tokio::test]
async fn test_user_session_never_fetches() {
    let s = session().await;
    s.backend
        .set_notifications(vec![notification_json(1, "Bienvenue", "", false)]);
    assert!(s.auth.login(USER_EMAIL, &password(), None).await);
    let store = NotificationStore::new(Arc::clone(&s.client));

    store.fetch(s.auth.identity().as_ref()).await;

    assert!(store.notifications().is_empty());
}

// =============================================================================
// Push channel
// =============================================================================

fn spawn_channel(
    s: &Session,
    store: &Arc<NotificationStore<BackendClient>>,
) -> NotificationChannel {
    let config = s.backend.client_config();
    NotificationChannel::spawn(
        WebSocketTransport::new(config.push_url, (*s.client).clone()),
        Arc::clone(store),
        s.auth.subscribe(),
        NoopNotifier,
        config.connect_debounce,
    )
}

#[tokio::test]
async fn test_push_reaches_store_over_websocket() {
    let s = session().await;
    s.backend.set_notifications(vec![
        notification_json(1, "Bienvenue", "", false),
        notification_json(2, "Rappel", "", false),
    ]);
    assert!(s.auth.login(ADMIN_EMAIL, &password(), None).await);
    let store = Arc::new(NotificationStore::new(Arc::clone(&s.client)));
    let channel = spawn_channel(&s, &store);

    let mut state = channel.subscribe();
    wait_for(&mut state, |state| *state == ChannelState::Connected).await;
    s.backend.wait_for_push_connections(1).await;
    // Backlog first, so the push cannot be overwritten by it.
    let mut unread = store.subscribe_unread();
    wait_for(&mut unread, |count| *count == 2).await;

    s.backend.push_raw("not json");
    s.backend.push(&PushFrame {
        event: "something_else".to_string(),
        data: json!({"id": 99}),
    });
    s.backend.push(&PushFrame::new_notification(json!({
        "id": 7,
        "title": "Nouvelle idée",
        "message": "Alice a soumis une nouvelle idée : 'Idea Title'",
        "type": "info",
        "timestamp": "2024-01-01T00:00:00Z",
        "idea_id": 42
    })));

    wait_for(&mut unread, |count| *count == 3).await;
    let newest = store.notifications().into_iter().next().expect("pushed entry");
    assert_eq!(newest.id.as_str(), "7");
    assert_eq!(newest.related_id.as_deref(), Some("42"));
    assert!(!newest.is_read);
    assert!(store.get(&NotificationId::new("99")).is_none());

    channel.shutdown().await;
    s.backend.wait_for_push_connections(0).await;
}

#[tokio::test]
async fn test_logout_closes_push_connection() {
    let s = session().await;
    s.backend
        .set_notifications(vec![notification_json(1, "Bienvenue", "", false)]);
    assert!(s.auth.login(ADMIN_EMAIL, &password(), None).await);
    let store = Arc::new(NotificationStore::new(Arc::clone(&s.client)));
    let channel = spawn_channel(&s, &store);

    let mut state = channel.subscribe();
    wait_for(&mut state, |state| *state == ChannelState::Connected).await;
    s.backend.wait_for_push_connections(1).await;

    s.auth.logout().await;

    wait_for(&mut state, |state| *state == ChannelState::Disconnected).await;
    s.backend.wait_for_push_connections(0).await;
    assert!(store.notifications().is_empty());
    assert_eq!(store.unread_count(), 0);
}

#[tokio::test]
async fn test_user_session_never_connects() {
    let s = session().await;
    assert!(s.auth.login(USER_EMAIL, &password(), None).await);
    let store = Arc::new(NotificationStore::new(Arc::clone(&s.client)));
    let channel = spawn_channel(&s, &store);

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert_eq!(s.backend.push_connections(), 0);
    channel.shutdown().await;
}
