//! Innovation portal CLI - sessions and admin notifications from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in and show where the portal would land
//! portal login -e admin@portal.example
//!
//! # Show the identity of the session
//! portal whoami
//!
//! # List, open and mark notifications (admin only)
//! portal notifications list
//! portal notifications open 42
//! portal notifications read 42
//! portal notifications read-all
//!
//! # Stay connected and log pushed notifications until Ctrl+C
//! portal notifications watch
//! ```
//!
//! Credentials come from `--email` / `PORTAL_EMAIL` and `PORTAL_PASSWORD`.
//! Every invocation logs in afresh; no session is stored on disk.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "portal")]
#[command(author, version, about = "Innovation portal CLI")]
struct Cli {
    /// Login email (defaults to `PORTAL_EMAIL`)
    #[arg(short, long, global = true, env = "PORTAL_EMAIL")]
    email: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the post-login destination
    Login {
        /// Page to return to after login
        #[arg(long)]
        callback_url: Option<String>,
    },
    /// Show the identity of the current session
    Whoami,
    /// Admin notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },
}

#[derive(Subcommand)]
enum NotificationAction {
    /// List the most recent notifications
    List {
        /// Show every notification instead of the dropdown view
        #[arg(short, long)]
        all: bool,
    },
    /// Open a notification as if clicked in the dropdown
    Open {
        /// Notification ID
        id: String,
    },
    /// Mark one notification as read
    Read {
        /// Notification ID
        id: String,
    },
    /// Mark every notification as read
    ReadAll,
    /// Keep the push channel open and log notifications until Ctrl+C
    Watch,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal=info,innovation_portal_client=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let session = commands::Session::open(cli.email)?;

    match cli.command {
        Commands::Login { callback_url } => {
            commands::session::login(&session, callback_url.as_deref()).await?;
        }
        Commands::Whoami => commands::session::whoami(&session).await?,
        Commands::Notifications { action } => match action {
            NotificationAction::List { all } => {
                commands::notifications::list(&session, all).await?;
            }
            NotificationAction::Open { id } => {
                commands::notifications::open(&session, &id).await?;
            }
            NotificationAction::Read { id } => {
                commands::notifications::read(&session, &id).await?;
            }
            NotificationAction::ReadAll => commands::notifications::read_all(&session).await?,
            NotificationAction::Watch => commands::notifications::watch(&session).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_notification_commands() {
        let cli = Cli::try_parse_from(["portal", "notifications", "open", "42"]).expect("parse");
        assert!(matches!(
            cli.command,
            Commands::Notifications {
                action: NotificationAction::Open { ref id }
            } if id == "42"
        ));

        let cli = Cli::try_parse_from(["portal", "-e", "a@b.example", "notifications", "read-all"])
            .expect("parse");
        assert_eq!(cli.email.as_deref(), Some("a@b.example"));
        assert!(matches!(
            cli.command,
            Commands::Notifications {
                action: NotificationAction::ReadAll
            }
        ));
    }
}
