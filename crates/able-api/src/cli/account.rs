//! Account CLI subcommands: create, list, show.

use anyhow::{Result, anyhow};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use able_types::account::{AccountKind, NewAccount};

use super::{format_relative_time, resolve_account};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Register a new account.
    Create {
        /// Unique username (letters, digits and @ . + - _).
        username: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        #[arg(long)]
        email: Option<String>,

        /// Account kind (pwd, client, doctor, trainer, admin).
        #[arg(long)]
        kind: Option<String>,

        /// Grant staff rights (may run `admin` commands).
        #[arg(long)]
        staff: bool,
    },

    /// List accounts, newest first.
    #[command(alias = "ls")]
    List {
        /// Maximum number of accounts to show.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Show one account.
    Show {
        /// Account id or username.
        account: String,
    },
}

/// Handle an account subcommand.
pub async fn handle_account_command(
    cmd: AccountCommand,
    state: &AppState,
    json: bool,
    quiet: bool,
) -> Result<()> {
    match cmd {
        AccountCommand::Create {
            username,
            first_name,
            last_name,
            email,
            kind,
            staff,
        } => {
            let kind = kind
                .map(|k| k.parse::<AccountKind>().map_err(|e| anyhow!(e)))
                .transpose()?;
            let request = NewAccount {
                username,
                first_name,
                last_name,
                email,
                kind,
                is_staff: staff,
            };
            create_account(state, request, json, quiet).await
        }
        AccountCommand::List { limit } => list_accounts(state, limit, json).await,
        AccountCommand::Show { account } => show_account(state, &account, json).await,
    }
}

async fn create_account(
    state: &AppState,
    request: NewAccount,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let account = state.account_service.register(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
        return Ok(());
    }
    if quiet {
        println!("{}", account.id);
        return Ok(());
    }

    println!();
    println!("  {} Account created", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Username:").bold(), style(&account.username).cyan());
    println!("  {}      {}", style("Kind:").bold(), account.kind);
    if account.is_staff {
        println!("  {}     {}", style("Staff:").bold(), style("yes").yellow());
    }
    println!("  {}        {}", style("ID:").bold(), style(account.id.to_string()).dim());
    println!();

    Ok(())
}

async fn list_accounts(state: &AppState, limit: Option<i64>, json: bool) -> Result<()> {
    let accounts = state.account_service.list(limit, None).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }

    if accounts.is_empty() {
        println!();
        println!(
            "  {} No accounts yet. Create one with: {}",
            style("i").blue().bold(),
            style("able account create <username>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("").fg(Color::White),
        Cell::new("Username").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Joined").fg(Color::White),
    ]);

    for account in &accounts {
        let username = if account.is_staff {
            Cell::new(format!("{} (staff)", account.username)).fg(Color::Yellow)
        } else {
            Cell::new(&account.username).fg(Color::Cyan)
        };
        table.add_row(vec![
            Cell::new(&account.avatar).fg(Color::Magenta),
            username,
            Cell::new(account.display_name()),
            Cell::new(account.kind.to_string()),
            Cell::new(format_relative_time(&account.joined_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} account{}",
        style(accounts.len()).bold(),
        if accounts.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

async fn show_account(state: &AppState, id_or_username: &str, json: bool) -> Result<()> {
    let account = resolve_account(state, id_or_username).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style(&account.avatar).magenta().bold(),
        style(account.display_name()).cyan().bold()
    );
    println!();
    println!("  {}  {}", style("Username:").bold(), account.username);
    println!(
        "  {}     {}",
        style("Email:").bold(),
        account.email.as_deref().unwrap_or("-")
    );
    println!("  {}      {}", style("Kind:").bold(), account.kind);
    println!(
        "  {}     {}",
        style("Staff:").bold(),
        if account.is_staff { "yes" } else { "no" }
    );
    println!(
        "  {}  {}",
        style("Verified:").bold(),
        if account.is_verified { "yes" } else { "no" }
    );
    println!(
        "  {}    {}",
        style("Joined:").bold(),
        account.joined_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("  {}        {}", style("ID:").bold(), style(account.id.to_string()).dim());
    println!();

    Ok(())
}
