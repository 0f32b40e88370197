//! Admin notification channel.
//!
//! A single supervisor task follows the identity published by the auth
//! context and owns the push connection:
//!
//! ```text
//!                 admin identity            debounce elapsed, connected
//! Disconnected ─────────────────▶ Connecting ─────────────────────────▶ Connected
//!      ▲                              │                                     │
//!      └──────────────────────────────┴─────────────────────────────────────┘
//!        identity changed, shutdown, connect failure, remote close, read error
//! ```
//!
//! When an admin identity appears the store's backlog fetch starts right away,
//! alongside the debounce. A change of identity during the debounce cancels
//! the pending connect. There is no automatic reconnect: after a failure or a
//! remote close the channel stays disconnected until the identity changes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use innovation_portal_core::{Identity, NEW_NOTIFICATION_EVENT, PushFrame, PushedNotification};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::store::NotificationStore;
use super::transport::{PushConnection, PushTransport};
use crate::api::NotificationApi;

/// Connection state of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Disconnected,
    /// Waiting out the debounce, or the connect is in flight.
    Connecting,
    Connected,
}

/// Native notifications raised for pushed events.
pub trait DesktopNotifier: Send + Sync {
    /// Whether the user allowed native notifications.
    fn permission_granted(&self) -> bool;

    fn notify(&self, title: &str, body: &str);
}

/// Notifier for environments without native notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl DesktopNotifier for NoopNotifier {
    fn permission_granted(&self) -> bool {
        false
    }

    fn notify(&self, _title: &str, _body: &str) {}
}

/// Handle to the running channel.
///
/// Dropping the handle stops the supervisor in the background, closing any
/// open connection; [`NotificationChannel::shutdown`] does the same and waits
/// for it to finish.
pub struct NotificationChannel {
    state: watch::Receiver<ChannelState>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl NotificationChannel {
    /// Start the supervisor for `identity`.
    pub fn spawn<T, A, D>(
        transport: T,
        store: Arc<NotificationStore<A>>,
        identity: watch::Receiver<Option<Identity>>,
        notifier: D,
        debounce: Duration,
    ) -> Self
    where
        T: PushTransport + 'static,
        A: NotificationApi + 'static,
        D: DesktopNotifier + 'static,
    {
        let (state_tx, state) = watch::channel(ChannelState::Disconnected);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let supervisor = Supervisor {
            transport,
            store,
            notifier,
            identity,
            shutdown: shutdown_rx,
            state: state_tx,
            debounce,
        };
        let task = tokio::spawn(supervisor.run());

        Self {
            state,
            shutdown,
            task: Some(task),
        }
    }

    #[must_use]
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Cancel any pending connect, close the connection and wait for the
    /// supervisor to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.send_replace(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Notification channel task failed");
            }
        }
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        // The task stays detached and winds down through the usual close path.
        self.shutdown.send_replace(true);
    }
}

enum SessionEnd {
    IdentityChanged,
    Shutdown,
}

struct Supervisor<T, A, D> {
    transport: T,
    store: Arc<NotificationStore<A>>,
    notifier: D,
    identity: watch::Receiver<Option<Identity>>,
    shutdown: watch::Receiver<bool>,
    state: watch::Sender<ChannelState>,
    debounce: Duration,
}

impl<T, A, D> Supervisor<T, A, D>
where
    T: PushTransport,
    A: NotificationApi,
    D: DesktopNotifier,
{
    async fn run(mut self) {
        loop {
            let current = self.identity.borrow_and_update().clone();
            let end = match current.filter(Identity::is_admin) {
                Some(admin) => self.admin_session(admin).await,
                None => {
                    self.store.clear();
                    interrupted(&mut self.identity, &mut self.shutdown, None).await
                }
            };

            if matches!(end, SessionEnd::Shutdown) {
                break;
            }
        }

        self.state.send_replace(ChannelState::Disconnected);
        debug!("Notification channel stopped");
    }

    /// Run one admin session; returns once the identity changes or on shutdown.
    async fn admin_session(&mut self, admin: Identity) -> SessionEnd {
        let Self {
            transport,
            store,
            notifier,
            identity,
            shutdown,
            state,
            debounce,
        } = self;
        let store: &NotificationStore<A> = store;
        let transport: &T = transport;
        let notifier: &D = notifier;
        let state: &watch::Sender<ChannelState> = state;
        let current = Some(&admin);

        let backlog = store.fetch(current);
        tokio::pin!(backlog);
        let mut backlog_done = false;

        set_state(state, ChannelState::Connecting);
        let delay = tokio::time::sleep(*debounce);
        tokio::pin!(delay);

        let end = 'session: {
            loop {
                tokio::select! {
                    () = &mut backlog, if !backlog_done => backlog_done = true,
                    () = &mut delay => break,
                    end = interrupted(identity, shutdown, current) => {
                        debug!("Pending connect cancelled");
                        break 'session Some(end);
                    }
                }
            }

            let connect = transport.connect();
            tokio::pin!(connect);
            let connected = loop {
                tokio::select! {
                    () = &mut backlog, if !backlog_done => backlog_done = true,
                    result = &mut connect => break result,
                    end = interrupted(identity, shutdown, current) => break 'session Some(end),
                }
            };

            let mut connection = match connected {
                Ok(connection) => connection,
                Err(e) => {
                    warn!(error = %e, "Notification channel connect failed");
                    break 'session None;
                }
            };
            set_state(state, ChannelState::Connected);
            info!(user_id = %admin.id, "Notification channel connected");

            let end = loop {
                tokio::select! {
                    () = &mut backlog, if !backlog_done => backlog_done = true,
                    message = connection.next_message() => match message {
                        Some(Ok(text)) => handle_message(store, notifier, &text),
                        Some(Err(e)) => {
                            warn!(error = %e, "Notification channel read failed");
                            break None;
                        }
                        None => {
                            info!("Notification channel closed by server");
                            break None;
                        }
                    },
                    end = interrupted(identity, shutdown, current) => break Some(end),
                }
            };

            connection.close().await;
            end
        };

        set_state(state, ChannelState::Disconnected);
        if let Some(end) = end {
            return end;
        }

        // Stay disconnected until the identity changes.
        loop {
            tokio::select! {
                () = &mut backlog, if !backlog_done => backlog_done = true,
                end = interrupted(identity, shutdown, current) => return end,
            }
        }
    }
}

fn set_state(state: &watch::Sender<ChannelState>, next: ChannelState) {
    let previous = state.send_replace(next);
    if previous != next {
        debug!(?previous, ?next, "Notification channel state");
    }
}

/// Resolves on shutdown, or once the identity differs from `current`.
async fn interrupted(
    identity: &mut watch::Receiver<Option<Identity>>,
    shutdown: &mut watch::Receiver<bool>,
    current: Option<&Identity>,
) -> SessionEnd {
    let identity_changed = async {
        loop {
            if identity.changed().await.is_err() {
                // The auth context is gone; nothing can change the identity now.
                std::future::pending::<()>().await;
            }
            if identity.borrow_and_update().as_ref() != current {
                return;
            }
        }
    };

    tokio::select! {
        () = identity_changed => SessionEnd::IdentityChanged,
        // A dropped handle counts as a stop request.
        _ = shutdown.wait_for(|stop| *stop) => SessionEnd::Shutdown,
    }
}

/// Apply one push message to the store. Bad messages are logged and skipped.
fn handle_message<A, D>(store: &NotificationStore<A>, notifier: &D, text: &str)
where
    A: NotificationApi,
    D: DesktopNotifier,
{
    let frame: PushFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "Skipping malformed push frame");
            return;
        }
    };

    if frame.event != NEW_NOTIFICATION_EVENT {
        debug!(event = %frame.event, "Ignoring push event");
        return;
    }

    let pushed: PushedNotification = match serde_json::from_value(frame.data) {
        Ok(pushed) => pushed,
        Err(e) => {
            warn!(error = %e, "Skipping malformed notification payload");
            return;
        }
    };

    let notification = pushed.into_notification(Utc::now());
    debug!(
        notification_id = %notification.id,
        related_id = ?notification.related_id,
        "Notification received"
    );

    if notifier.permission_granted() {
        notifier.notify(&notification.title, &notification.message);
    }
    store.push(notification);
}
