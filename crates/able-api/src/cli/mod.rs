//! CLI command definitions and dispatch for the `able` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! noun (e.g., `able account create`, `able chat send`).

pub mod account;
pub mod admin;
pub mod chat;
pub mod status;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;

use able_types::account::Account;
use able_types::chat::ConversationId;

use crate::state::AppState;

/// Two-party chat between platform members.
#[derive(Parser)]
#[command(name = "able", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log errors and drop confirmation messages. Requested data
    /// still prints; create commands print just the new id.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register and look up accounts.
    Account {
        #[command(subcommand)]
        action: account::AccountCommand,
    },

    /// Open conversations, send and read messages.
    Chat {
        #[command(subcommand)]
        action: chat::ChatCommand,
    },

    /// Staff actions: conversation overview, bulk initiation, deactivation.
    Admin {
        #[command(subcommand)]
        action: admin::AdminCommand,
    },

    /// System status dashboard.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Look up an account given its id or username.
pub(crate) async fn resolve_account(state: &AppState, id_or_username: &str) -> Result<Account> {
    state
        .account_service
        .resolve(id_or_username)
        .await
        .with_context(|| format!("Account '{id_or_username}' not found"))
}

pub(crate) fn parse_conversation_id(raw: &str) -> Result<ConversationId> {
    raw.parse::<ConversationId>()
        .with_context(|| format!("'{raw}' is not a valid conversation id"))
}

pub(crate) fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let diff = now - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}

/// First eight characters of an id, enough to tell rows apart in a table.
pub(crate) fn short_id(id: &impl std::fmt::Display) -> String {
    id.to_string().chars().take(8).collect()
}
