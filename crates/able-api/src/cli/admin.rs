//! Staff CLI subcommands: conversation overview, bulk chat initiation and
//! conversation deactivation.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use able_types::chat::InitiatedChat;

use super::{format_relative_time, parse_conversation_id, resolve_account, short_id};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum AdminCommand {
    /// List every conversation, including inactive ones, most recent first.
    #[command(alias = "ls")]
    Conversations {
        /// Maximum number of conversations to show.
        #[arg(long)]
        limit: Option<i64>,

        /// Number of conversations to skip.
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Open a conversation with each target and greet the new ones.
    Initiate {
        /// Staff account id or username.
        #[arg(long = "as", value_name = "ACCOUNT")]
        admin: String,

        /// Target account ids or usernames.
        #[arg(
            required_unless_present = "from_conversation",
            conflicts_with = "from_conversation"
        )]
        targets: Vec<String>,

        /// Reach every participant of this conversation instead (repeatable).
        #[arg(long = "from-conversation", value_name = "CONVERSATION")]
        from_conversation: Vec<String>,

        /// Greeting to send; `{username}` is replaced with each target's
        /// username. Defaults to `chat.admin_greeting`, or
        /// `chat.followup_greeting` with `--from-conversation`.
        #[arg(long, short)]
        message: Option<String>,
    },

    /// Deactivate a conversation. The pair may start a new one afterwards.
    Deactivate {
        /// Conversation id.
        conversation: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

/// Handle an admin subcommand.
pub async fn handle_admin_command(
    cmd: AdminCommand,
    state: &AppState,
    json: bool,
    quiet: bool,
) -> Result<()> {
    match cmd {
        AdminCommand::Conversations { limit, offset } => {
            list_conversations(state, limit, offset, json).await
        }
        AdminCommand::Initiate {
            admin,
            targets,
            from_conversation,
            message,
        } => {
            initiate(
                state,
                &admin,
                &targets,
                &from_conversation,
                message.as_deref(),
                json,
                quiet,
            )
            .await
        }
        AdminCommand::Deactivate {
            conversation,
            force,
        } => deactivate(state, &conversation, force, json, quiet).await,
    }
}

async fn list_conversations(
    state: &AppState,
    limit: Option<i64>,
    offset: Option<i64>,
    json: bool,
) -> Result<()> {
    let overview = state.chat_service.overview(limit, offset).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }

    if overview.is_empty() {
        println!();
        println!("  {} No conversations yet.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Participants").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("Last active").fg(Color::White),
        Cell::new("").fg(Color::White),
    ]);

    for entry in &overview {
        let participants = entry
            .participants
            .iter()
            .map(|p| p.username.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let state_cell = if entry.conversation.is_active {
            Cell::new("active").fg(Color::Green)
        } else {
            Cell::new("inactive").fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(entry.conversation.id.to_string()).fg(Color::DarkGrey),
            Cell::new(participants).fg(Color::Cyan),
            Cell::new(entry.message_count),
            Cell::new(entry.conversation.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(format_relative_time(&entry.conversation.updated_at)).fg(Color::DarkGrey),
            state_cell,
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} conversation{}",
        style(overview.len()).bold(),
        if overview.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

async fn initiate(
    state: &AppState,
    admin: &str,
    targets: &[String],
    from_conversations: &[String],
    message: Option<&str>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let admin = resolve_account(state, admin).await?;

    let initiated = if from_conversations.is_empty() {
        let mut target_ids = Vec::with_capacity(targets.len());
        for target in targets {
            target_ids.push(resolve_account(state, target).await?.id);
        }
        state
            .chat_service
            .initiate(&admin.id, &target_ids, message)
            .await?
    } else {
        let conversation_ids = from_conversations
            .iter()
            .map(|raw| parse_conversation_id(raw))
            .collect::<Result<Vec<_>>>()?;
        state
            .chat_service
            .initiate_from_conversations(&admin.id, &conversation_ids, message)
            .await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&initiated)?);
        return Ok(());
    }
    if quiet {
        return Ok(());
    }

    if initiated.is_empty() {
        println!("  {} No targets besides yourself.", style("i").blue().bold());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Target").fg(Color::White),
        Cell::new("Conversation").fg(Color::White),
        Cell::new("").fg(Color::White),
    ]);

    for chat in &initiated {
        let username = target_name(state, chat).await;
        let state_cell = if chat.message.is_some() {
            Cell::new("greeted").fg(Color::Green)
        } else {
            Cell::new("existing").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(username).fg(Color::Cyan),
            Cell::new(chat.conversation_id.to_string()).fg(Color::DarkGrey),
            state_cell,
        ]);
    }

    let greeted = initiated.iter().filter(|c| c.message.is_some()).count();

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} Greeted {} new conversation{}, {} already open",
        style("✓").green().bold(),
        greeted,
        if greeted == 1 { "" } else { "s" },
        initiated.len() - greeted
    );
    println!();

    Ok(())
}

async fn target_name(state: &AppState, chat: &InitiatedChat) -> String {
    resolve_account(state, &chat.target.to_string())
        .await
        .map(|account| account.username)
        .unwrap_or_else(|_| short_id(&chat.target))
}

async fn deactivate(
    state: &AppState,
    conversation: &str,
    force: bool,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let conversation_id = parse_conversation_id(conversation)?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Deactivate conversation {}? Participants will no longer see it.",
                style(short_id(&conversation_id)).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.chat_service.deactivate(&conversation_id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deactivated": true, "conversation_id": conversation_id})
        );
    } else if !quiet {
        println!(
            "  {} Conversation {} deactivated.",
            style("✓").red().bold(),
            short_id(&conversation_id)
        );
    }

    Ok(())
}
