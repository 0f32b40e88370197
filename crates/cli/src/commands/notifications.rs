//! Admin notification commands.

use std::sync::Arc;

use innovation_portal_client::BackendClient;
use innovation_portal_client::notifications::{
    DesktopNotifier, NotificationChannel, NotificationDropdown, NotificationStore,
    WebSocketTransport,
};
use innovation_portal_core::{Notification, NotificationId};

use super::{CliError, LogNavigator, Session};

/// Writes pushed notifications to the log.
struct LogNotifier;

impl DesktopNotifier for LogNotifier {
    fn permission_granted(&self) -> bool {
        true
    }

    fn notify(&self, title: &str, body: &str) {
        tracing::info!("New notification: {title} - {body}");
    }
}

/// Log in as an admin and load the backlog.
async fn load(session: &Session) -> Result<Arc<NotificationStore<BackendClient>>, CliError> {
    session.ensure_login(None).await?;
    let identity = session.auth.identity().filter(|i| i.is_admin());
    let Some(identity) = identity else {
        return Err(CliError::NotAdmin);
    };

    let store = Arc::new(NotificationStore::new(Arc::clone(&session.backend)));
    store.fetch(Some(&identity)).await;
    Ok(store)
}

fn log_entry(notification: &Notification) {
    tracing::info!(
        "{} [{}] {} {} - {}",
        if notification.is_read { " " } else { "●" },
        notification.id,
        notification.created_at.format("%Y-%m-%d %H:%M"),
        notification.title,
        notification.message
    );
}

/// List notifications, dropdown-style unless `all` is set.
pub async fn list(session: &Session, all: bool) -> Result<(), CliError> {
    let store = load(session).await?;

    if all {
        let snapshot = store.snapshot();
        tracing::info!(
            "{} notifications, {} unread",
            snapshot.notifications.len(),
            snapshot.unread_count
        );
        snapshot.notifications.iter().for_each(log_entry);
        return Ok(());
    }

    let view = NotificationDropdown::new(Arc::clone(&store), LogNavigator).view();
    tracing::info!("{} unread", view.unread_count);
    view.items.iter().for_each(log_entry);
    if let Some(link) = view.see_all {
        tracing::info!("More notifications at {link} (use --all)");
    }
    Ok(())
}

/// Open a notification: mark it read and report where it leads.
pub async fn open(session: &Session, id: &str) -> Result<(), CliError> {
    let store = load(session).await?;
    let id = NotificationId::new(id);
    if store.get(&id).is_none() {
        return Err(CliError::NotFound(id.to_string()));
    }

    let dropdown = NotificationDropdown::new(store, LogNavigator);
    if dropdown.click(&id).await.is_none() {
        tracing::info!("Notification {id} has no destination");
    }
    Ok(())
}

/// Mark one notification as read.
pub async fn read(session: &Session, id: &str) -> Result<(), CliError> {
    let store = load(session).await?;
    let id = NotificationId::new(id);
    if store.get(&id).is_none() {
        return Err(CliError::NotFound(id.to_string()));
    }

    store.mark_as_read(&id).await;
    tracing::info!("Marked {id} as read, {} unread left", store.unread_count());
    Ok(())
}

/// Mark every notification as read.
pub async fn read_all(session: &Session) -> Result<(), CliError> {
    let store = load(session).await?;
    store.mark_all_as_read().await;
    tracing::info!("All notifications marked as read");
    Ok(())
}

/// Hold the push channel open until Ctrl+C.
pub async fn watch(session: &Session) -> Result<(), CliError> {
    session.ensure_login(None).await?;
    if !session.auth.is_admin() {
        return Err(CliError::NotAdmin);
    }

    let store = Arc::new(NotificationStore::new(Arc::clone(&session.backend)));
    let transport = WebSocketTransport::new(
        session.config.push_url.clone(),
        session.backend.as_ref().clone(),
    );
    let channel = NotificationChannel::spawn(
        transport,
        Arc::clone(&store),
        session.auth.subscribe(),
        LogNotifier,
        session.config.connect_debounce,
    );
    let mut state = channel.subscribe();

    tracing::info!("Watching {} (Ctrl+C to stop)", session.config.push_url);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                tracing::info!("Channel {current:?}");
            }
        }
    }

    channel.shutdown().await;
    let snapshot = store.snapshot();
    tracing::info!(
        "{} notifications received or loaded, {} unread",
        snapshot.notifications.len(),
        snapshot.unread_count
    );
    Ok(())
}
