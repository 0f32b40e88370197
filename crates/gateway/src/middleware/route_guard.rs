//! Route guard: request-time access control.
//!
//! Every request is classified by path prefix before anything is forwarded to
//! the page renderer. Gated requests are only forwarded after the backend has
//! verified the caller's session and the caller's role fits the path:
//!
//! | Verification outcome | Path | Role | Result |
//! |---|---|---|---|
//! | - | contains `.`/`..` segments | - | `400 Bad Request` |
//! | non-2xx | any gated | - | `/login?callbackUrl=<path>` |
//! | network error, timeout, bad body | any gated | - | `/` |
//! | ok | admin | no "admin" | `/unauthorized` |
//! | ok | user area | contains "admin" | `/unauthorized` |
//! | ok | user area | neither "admin" nor "user" | `/unauthorized` |
//! | ok | otherwise | - | forwarded |

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use innovation_portal_core::{Identity, Role, paths};
use tracing::{debug, warn};

use crate::config::GuardConfig;
use crate::error::{AppError, set_sentry_user};
use crate::services::VerifyError;
use crate::state::AppState;

/// How a gated path must be authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    /// The path is under an admin prefix.
    pub admin: bool,
    /// The path is under a user-area prefix.
    pub user_area: bool,
}

/// Outcome of the guard for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Forward the request.
    Proceed,
    /// Not logged in: send to the login page, then back to `callback`.
    Login { callback: String },
    /// Logged in with the wrong role.
    Unauthorized,
    /// Verification could not complete.
    Home,
}

impl GuardDecision {
    /// Redirect target, or `None` for [`GuardDecision::Proceed`].
    #[must_use]
    pub fn redirect_target(&self) -> Option<String> {
        match self {
            Self::Proceed => None,
            Self::Login { callback } => Some(login_url(callback)),
            Self::Unauthorized => Some(paths::UNAUTHORIZED.to_string()),
            Self::Home => Some(paths::HOME.to_string()),
        }
    }
}

impl IntoResponse for GuardDecision {
    fn into_response(self) -> Response {
        match self.redirect_target() {
            Some(target) => Redirect::temporary(&target).into_response(),
            // Proceed is handled by the middleware before it gets here.
            None => Redirect::temporary(paths::HOME).into_response(),
        }
    }
}

/// Path classifier built from [`GuardConfig`].
#[derive(Debug, Clone)]
pub struct RouteGuard {
    config: GuardConfig,
}

impl RouteGuard {
    #[must_use]
    pub const fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    /// Classify `path`; `None` means the path is not gated.
    ///
    /// Public prefixes win over every other list.
    #[must_use]
    pub fn classify(&self, path: &str) -> Option<Classification> {
        if matches_any(path, &self.config.public_prefixes) {
            return None;
        }

        let class = Classification {
            admin: matches_any(path, &self.config.admin_prefixes),
            user_area: matches_any(path, &self.config.user_prefixes),
        };
        let gated =
            class.admin || class.user_area || matches_any(path, &self.config.auth_prefixes);

        gated.then_some(class)
    }
}

fn matches_any(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

/// Decide whether a verified `role` may access a path of class `class`.
#[must_use]
pub fn authorize(class: Classification, role: &Role) -> GuardDecision {
    if class.admin && !role.is_admin() {
        return GuardDecision::Unauthorized;
    }

    if class.user_area && (role.is_admin() || !role.is_user()) {
        return GuardDecision::Unauthorized;
    }

    GuardDecision::Proceed
}

/// Map a verification failure to a decision.
#[must_use]
pub fn on_verify_error(error: &VerifyError, callback: &str) -> GuardDecision {
    if error.is_unauthenticated() {
        GuardDecision::Login {
            callback: callback.to_string(),
        }
    } else {
        GuardDecision::Home
    }
}

/// Whether `path` has a `.` or `..` segment, literal or percent-encoded.
///
/// The upstream URL resolves these segments, prefix matching does not, so a
/// request carrying one is rejected before it is classified.
#[must_use]
pub fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}

/// Build the login URL carrying `callback` as `callbackUrl`.
#[must_use]
pub fn login_url(callback: &str) -> String {
    format!(
        "{}?{}={}",
        paths::LOGIN,
        paths::CALLBACK_URL_PARAM,
        urlencoding::encode(callback)
    )
}

/// Axum middleware applying the route guard.
///
/// On success the verified [`Identity`] is added to the request extensions.
pub async fn route_guard_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if has_dot_segment(&path) {
        warn!(%path, "Rejecting path with dot segments");
        return AppError::BadRequest("path contains dot segments".to_string()).into_response();
    }

    let Some(class) = state.guard().classify(&path) else {
        return next.run(request).await;
    };

    let callback = request
        .uri()
        .path_and_query()
        .map_or_else(|| path.clone(), ToString::to_string);

    let identity: Identity = match state.verifier().verify(request.headers()).await {
        Ok(identity) => identity,
        Err(error) => {
            let decision = on_verify_error(&error, &callback);
            if error.is_unauthenticated() {
                debug!(%path, "No valid session, redirecting to login");
            } else {
                warn!(%path, error = %error, "Session verification failed, redirecting home");
            }
            return decision.into_response();
        }
    };

    let decision = authorize(class, &identity.role);
    debug!(
        %path,
        admin_path = class.admin,
        user_path = class.user_area,
        role = %identity.role,
        ?decision,
        "Route guard decision"
    );

    if decision != GuardDecision::Proceed {
        return decision.into_response();
    }

    set_sentry_user(&identity.id, Some(identity.email.as_str()).filter(|e| !e.is_empty()));
    request.extensions_mut().insert(identity);
    next.run(request).await
}
