//! Session commands.

use super::{CliError, Session};

/// Log in and report where the portal would send the user.
pub async fn login(session: &Session, callback_url: Option<&str>) -> Result<(), CliError> {
    session.ensure_login(callback_url).await?;

    if let Some(identity) = session.auth.identity() {
        tracing::info!(
            "Logged in as {} <{}> (role: {})",
            identity.name,
            identity.email,
            identity.role
        );
    }
    Ok(())
}

/// Print the identity of the session.
pub async fn whoami(session: &Session) -> Result<(), CliError> {
    session.ensure_login(None).await?;

    match session.auth.identity() {
        Some(identity) => tracing::info!(
            "ID: {}, Name: {}, Email: {}, Role: {}, Admin: {}",
            identity.id,
            identity.name,
            identity.email,
            identity.role,
            identity.is_admin()
        ),
        None => tracing::warn!("Not logged in"),
    }
    Ok(())
}
