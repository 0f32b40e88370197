//! Integration test support for the innovation portal.
//!
//! Tests run against an in-process [`MockBackend`] that speaks the same HTTP
//! and WebSocket contract as the real backend, bound to an ephemeral port.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p innovation-portal-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `gateway_guard` - Route guard and proxying through the gateway router
//! - `client_notifications` - Auth context, notification store and push channel

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use innovation_portal_client::ClientConfig;
use innovation_portal_core::PushFrame;
use innovation_portal_gateway::GatewayConfig;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const USER_EMAIL: &str = "user@example.com";
pub const PASSWORD: &str = "correct horse";

/// Message returned by the mock for rejected credentials.
pub const BAD_CREDENTIALS: &str = "Email ou mot de passe incorrect";

/// Name of the session cookie set by the mock login.
pub const SESSION_COOKIE: &str = "session";

/// Upper bound for any wait in the tests.
pub const WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// Test server
// =============================================================================

/// An axum router served on `127.0.0.1` with an ephemeral port.
pub struct TestServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Self { addr, task }
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A base URL nothing listens on.
#[must_use]
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("Listener has no address");
    drop(listener);
    format!("http://{addr}")
}

/// Page renderer stand-in: answers every request with `page <path-and-query>`.
pub async fn spawn_frontend() -> TestServer {
    let router = Router::new().fallback(|uri: axum::http::Uri| async move {
        let target = uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), ToString::to_string);
        format!("page {target}")
    });
    TestServer::spawn(router).await
}

// =============================================================================
// Mock backend
// =============================================================================

struct Account {
    password: String,
    user: Value,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    /// Session token to account email.
    sessions: HashMap<String, String>,
    notifications: Vec<Value>,
    marked: Vec<String>,
    mark_all_calls: usize,
}

#[derive(Clone)]
struct Backend {
    inner: Arc<Mutex<Inner>>,
    pushes: broadcast::Sender<String>,
    connections: Arc<watch::Sender<usize>>,
}

impl Backend {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The account behind the request's session cookie.
    fn session_user(&self, headers: &HeaderMap) -> Option<Value> {
        let token = session_token(headers)?;
        let inner = self.lock();
        let email = inner.sessions.get(&token)?;
        inner.accounts.get(email).map(|account| account.user.clone())
    }

    fn is_admin(&self, headers: &HeaderMap) -> bool {
        self.session_user(headers)
            .and_then(|user| user["role"].as_str().map(str::to_lowercase))
            .is_some_and(|role| role.contains("admin"))
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Token invalide"})),
    )
        .into_response()
}

/// In-process backend with accounts, sessions, notifications and a push endpoint.
///
/// Seeded with an admin (`ADMIN_EMAIL`) and a user (`USER_EMAIL`), both using
/// `PASSWORD`.
pub struct MockBackend {
    backend: Backend,
    server: TestServer,
}

impl MockBackend {
    pub async fn start() -> Self {
        let (pushes, _) = broadcast::channel(16);
        let (connections, _) = watch::channel(0);
        let backend = Backend {
            inner: Arc::default(),
            pushes,
            connections: Arc::new(connections),
        };

        {
            let mut inner = backend.lock();
            inner.accounts.insert(
                ADMIN_EMAIL.to_string(),
                Account {
                    password: PASSWORD.to_string(),
                    user: json!({"id": 1, "username": "Alice Admin", "email": ADMIN_EMAIL, "role": "Admin"}),
                },
            );
            inner.accounts.insert(
                USER_EMAIL.to_string(),
                Account {
                    password: PASSWORD.to_string(),
                    user: json!({"id": 2, "username": "Bob", "email": USER_EMAIL, "role": "user"}),
                },
            );
        }

        let router = Router::new()
            .route("/api/verify-token", get(verify))
            .route("/api/login", post(login))
            .route("/logout", post(logout))
            .route("/api/notifications", get(list_notifications))
            .route("/api/notifications/read-all", put(mark_all_read))
            .route("/api/notifications/{id}/read", put(mark_read))
            .route("/ws/notifications", get(push_socket))
            .with_state(backend.clone());

        Self {
            backend,
            server: TestServer::spawn(router).await,
        }
    }

    /// HTTP base URL.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// WebSocket push endpoint.
    #[must_use]
    pub fn push_url(&self) -> String {
        format!("ws://{}/ws/notifications", self.server.addr())
    }

    /// Open a session for `email` without going through login.
    ///
    /// Returns a `Cookie` header value.
    #[must_use]
    pub fn session_cookie(&self, email: &str) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.backend
            .lock()
            .sessions
            .insert(token.clone(), email.to_string());
        format!("{SESSION_COOKIE}={token}")
    }

    /// Drop every session, as if they all expired.
    pub fn expire_sessions(&self) {
        self.backend.lock().sessions.clear();
    }

    /// Replace the notification backlog.
    pub fn set_notifications(&self, notifications: Vec<Value>) {
        self.backend.lock().notifications = notifications;
    }

    #[must_use]
    pub fn is_read(&self, id: &str) -> bool {
        self.backend
            .lock()
            .notifications
            .iter()
            .any(|n| n["id"].to_string().trim_matches('"') == id && n["is_read"] == true)
    }

    /// Ids passed to the mark-read endpoint, in call order.
    #[must_use]
    pub fn marked(&self) -> Vec<String> {
        self.backend.lock().marked.clone()
    }

    #[must_use]
    pub fn mark_all_calls(&self) -> usize {
        self.backend.lock().mark_all_calls
    }

    /// Send `frame` to every open push connection.
    pub fn push(&self, frame: &PushFrame) {
        let text = serde_json::to_string(frame).expect("Push frame serializes");
        let _ = self.backend.pushes.send(text);
    }

    /// Send a raw text message to every open push connection.
    pub fn push_raw(&self, text: &str) {
        let _ = self.backend.pushes.send(text.to_string());
    }

    #[must_use]
    pub fn push_connections(&self) -> usize {
        *self.backend.connections.borrow()
    }

    /// Wait until exactly `count` push connections are open.
    pub async fn wait_for_push_connections(&self, count: usize) {
        let mut connections = self.backend.connections.subscribe();
        tokio::time::timeout(WAIT, connections.wait_for(|open| *open == count))
            .await
            .expect("Timed out waiting for push connections")
            .map(drop)
            .expect("Connection counter dropped");
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let backend_url = self.url();
        let push_url = self.push_url();
        ClientConfig::from_source(|key| match key {
            "PORTAL_BACKEND_URL" => Some(backend_url.clone()),
            "PORTAL_PUSH_URL" => Some(push_url.clone()),
            "PORTAL_CONNECT_DEBOUNCE_MS" => Some("10".to_string()),
            _ => None,
        })
        .expect("Valid client config")
    }
}

/// Gateway configuration pointing at the given upstreams.
#[must_use]
pub fn gateway_config(backend_url: &str, frontend_url: &str) -> GatewayConfig {
    GatewayConfig::from_source(|key| match key {
        "BACKEND_URL" => Some(backend_url.to_string()),
        "FRONTEND_URL" => Some(frontend_url.to_string()),
        "VERIFY_TIMEOUT_MS" => Some("2000".to_string()),
        _ => None,
    })
    .expect("Valid gateway config")
}

/// A backlog entry as the backend serializes it.
#[must_use]
pub fn notification_json(id: u64, title: &str, message: &str, is_read: bool) -> Value {
    json!({
        "id": id,
        "title": title,
        "message": message,
        "type": "info",
        "is_read": is_read,
        "created_at": "2024-01-01T00:00:00",
        "related_id": null
    })
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn verify(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    match backend.session_user(&headers) {
        Some(user) => Json(json!({"user": user})).into_response(),
        None => unauthorized(),
    }
}

async fn login(State(backend): State<Backend>, Json(body): Json<LoginBody>) -> Response {
    let user = {
        let inner = backend.lock();
        inner
            .accounts
            .get(&body.email)
            .filter(|account| account.password == body.password)
            .map(|account| account.user.clone())
    };

    let Some(user) = user else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": BAD_CREDENTIALS})),
        )
            .into_response();
    };

    let token = uuid::Uuid::new_v4().to_string();
    backend.lock().sessions.insert(token.clone(), body.email);

    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly"),
        )],
        Json(json!({"message": "Connexion réussie", "user": user})),
    )
        .into_response()
}

async fn logout(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        backend.lock().sessions.remove(&token);
    }

    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}=; Path=/; Max-Age=0"),
        )],
        Json(json!({"message": "Déconnecté"})),
    )
        .into_response()
}

async fn list_notifications(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !backend.is_admin(&headers) {
        return unauthorized();
    }

    let notifications = backend.lock().notifications.clone();
    let unread_count = notifications.iter().filter(|n| n["is_read"] != true).count();
    Json(json!({"notifications": notifications, "unread_count": unread_count})).into_response()
}

async fn mark_read(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if backend.session_user(&headers).is_none() {
        return unauthorized();
    }

    let mut inner = backend.lock();
    for notification in &mut inner.notifications {
        if notification["id"].to_string().trim_matches('"') == id {
            notification["is_read"] = Value::Bool(true);
        }
    }
    inner.marked.push(id);
    Json(json!({"success": true})).into_response()
}

async fn mark_all_read(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if backend.session_user(&headers).is_none() {
        return unauthorized();
    }

    let mut inner = backend.lock();
    for notification in &mut inner.notifications {
        notification["is_read"] = Value::Bool(true);
    }
    inner.mark_all_calls += 1;
    Json(json!({"success": true})).into_response()
}

async fn push_socket(
    State(backend): State<Backend>,
    headers: HeaderMap,
    upgrade: WebSocketUpgrade,
) -> Response {
    if !backend.is_admin(&headers) {
        return unauthorized();
    }

    // Subscribe before the handshake completes so no push is missed.
    let frames = backend.pushes.subscribe();
    upgrade.on_upgrade(move |socket| forward_pushes(socket, frames, backend.connections))
}

async fn forward_pushes(
    mut socket: WebSocket,
    mut frames: broadcast::Receiver<String>,
    connections: Arc<watch::Sender<usize>>,
) {
    connections.send_modify(|open| *open += 1);

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    connections.send_modify(|open| *open = open.saturating_sub(1));
}
