//! Auth context: the client's view of who is logged in.
//!
//! The identity lives in a `watch` channel. UI code reads it, the
//! notification channel subscribes to it, and only this module writes it.
//! Nothing is persisted: the identity is rebuilt by [`AuthContext::hydrate`]
//! or [`AuthContext::login`] every time the client starts.

use std::sync::{Arc, Mutex, PoisonError};

use innovation_portal_core::{Email, Identity, paths};
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::SessionApi;
use crate::navigation::Navigator;

/// Where to send the user after a successful login.
///
/// A usable `callback_url` wins; otherwise admins land on the project admin
/// page and everyone else on their own projects. Only same-origin paths are
/// honoured as callbacks.
#[must_use]
pub fn post_login_destination(identity: &Identity, callback_url: Option<&str>) -> String {
    if let Some(callback) = callback_url.map(str::trim).filter(|c| is_local_callback(c)) {
        return callback.to_string();
    }

    if identity.is_admin() {
        paths::ADMIN_LANDING.to_string()
    } else {
        paths::USER_LANDING.to_string()
    }
}

fn is_local_callback(callback: &str) -> bool {
    callback != paths::HOME && callback.starts_with('/') && !callback.starts_with("//")
}

/// Client-side identity store with login and logout.
pub struct AuthContext<A, N> {
    api: Arc<A>,
    navigator: N,
    identity: watch::Sender<Option<Identity>>,
    error: Mutex<Option<String>>,
}

impl<A: SessionApi, N: Navigator> AuthContext<A, N> {
    pub fn new(api: Arc<A>, navigator: N) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            api,
            navigator,
            identity,
            error: Mutex::new(None),
        }
    }

    /// The current identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// Whether the current identity is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity.borrow().as_ref().is_some_and(Identity::is_admin)
    }

    /// Observe identity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    /// The error of the last failed login, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Load the identity of the existing session, if there is one.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) -> Option<Identity> {
        match self.api.verify().await {
            Ok(identity) => {
                debug!(user_id = %identity.id, role = %identity.role, "Session restored");
                self.set_identity(Some(identity.clone()));
                Some(identity)
            }
            Err(e) if e.is_unauthorized() => {
                debug!("No active session");
                self.set_identity(None);
                None
            }
            Err(e) => {
                warn!(error = %e, "Session verification failed");
                self.set_identity(None);
                None
            }
        }
    }

    /// Log in and navigate to the post-login destination.
    ///
    /// Returns `false` and stores a readable error on failure. Concurrent
    /// calls are not deduplicated; the last one to finish decides the state.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        callback_url: Option<&str>,
    ) -> bool {
        let email = match Email::parse(email) {
            Ok(email) => email,
            Err(e) => {
                self.set_error(Some(e.to_string()));
                return false;
            }
        };

        match self.api.login(&email, password).await {
            Ok(identity) => {
                let destination = post_login_destination(&identity, callback_url);
                info!(user_id = %identity.id, role = %identity.role, %destination, "Logged in");
                self.set_identity(Some(identity));
                self.set_error(None);
                self.navigator.navigate(&destination);
                true
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.set_error(Some(e.user_message()));
                false
            }
        }
    }

    /// Log out, clear the identity and return home.
    ///
    /// The identity is cleared even when the backend call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "Logout request failed");
        }

        self.set_identity(None);
        self.navigator.navigate(paths::HOME);
    }

    fn set_identity(&self, identity: Option<Identity>) {
        self.identity.send_if_modified(|current| {
            if *current == identity {
                false
            } else {
                *current = identity;
                true
            }
        });
    }

    fn set_error(&self, error: Option<String>) {
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }
}
