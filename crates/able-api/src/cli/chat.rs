//! Chat CLI subcommands: open, send, read, summary, list, show.
//!
//! Accounts are given by id or username; conversations by id.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use able_types::account::{Account, AccountId};
use able_types::chat::ConversationSummary;

use super::{format_relative_time, parse_conversation_id, resolve_account, short_id};
use crate::state::AppState;

/// Longest message excerpt shown in list views.
const PREVIEW_CHARS: usize = 40;

#[derive(Subcommand)]
pub enum ChatCommand {
    /// Open (or create) the conversation between two accounts.
    Open {
        /// Your account id or username.
        me: String,

        /// The other account id or username.
        other: String,
    },

    /// Send a message.
    Send {
        /// Conversation id.
        conversation: String,

        /// Sending account id or username.
        #[arg(long = "as", value_name = "ACCOUNT")]
        sender: String,

        /// Message text.
        content: String,
    },

    /// Mark the other participant's messages as read.
    Read {
        /// Conversation id.
        conversation: String,

        /// Reading account id or username.
        #[arg(long = "as", value_name = "ACCOUNT")]
        viewer: String,
    },

    /// Last message and unread count.
    Summary {
        /// Conversation id.
        conversation: String,

        /// Viewing account id or username.
        #[arg(long = "as", value_name = "ACCOUNT")]
        viewer: String,
    },

    /// List your conversations, most recently active first.
    #[command(alias = "ls")]
    List {
        /// Viewing account id or username.
        #[arg(long = "as", value_name = "ACCOUNT")]
        viewer: String,
    },

    /// Show the full conversation (marks it read).
    Show {
        /// Conversation id.
        conversation: String,

        /// Viewing account id or username.
        #[arg(long = "as", value_name = "ACCOUNT")]
        viewer: String,
    },
}

/// Handle a chat subcommand.
pub async fn handle_chat_command(
    cmd: ChatCommand,
    state: &AppState,
    json: bool,
    quiet: bool,
) -> Result<()> {
    match cmd {
        ChatCommand::Open { me, other } => {
            open_conversation(state, &me, &other, json, quiet).await
        }
        ChatCommand::Send {
            conversation,
            sender,
            content,
        } => send_message(state, &conversation, &sender, &content, json, quiet).await,
        ChatCommand::Read {
            conversation,
            viewer,
        } => mark_read(state, &conversation, &viewer, json, quiet).await,
        ChatCommand::Summary {
            conversation,
            viewer,
        } => summary(state, &conversation, &viewer, json).await,
        ChatCommand::List { viewer } => list_conversations(state, &viewer, json).await,
        ChatCommand::Show {
            conversation,
            viewer,
        } => show_conversation(state, &conversation, &viewer, json).await,
    }
}

async fn open_conversation(
    state: &AppState,
    me: &str,
    other: &str,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let me = resolve_account(state, me).await?;
    let other = resolve_account(state, other).await?;

    let opened = state.chat_service.get_or_create(&me.id, &other.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&opened)?);
        return Ok(());
    }
    if quiet {
        println!("{}", opened.conversation.id);
        return Ok(());
    }

    println!();
    if opened.created {
        println!(
            "  {} Started a conversation with {}",
            style("✓").green().bold(),
            style(other.display_name()).cyan()
        );
    } else {
        println!(
            "  {} Conversation with {} already exists",
            style("i").blue().bold(),
            style(other.display_name()).cyan()
        );
    }
    println!(
        "  {}  {}",
        style("ID:").bold(),
        style(opened.conversation.id.to_string()).dim()
    );
    println!();

    Ok(())
}

async fn send_message(
    state: &AppState,
    conversation: &str,
    sender: &str,
    content: &str,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let conversation_id = parse_conversation_id(conversation)?;
    let sender = resolve_account(state, sender).await?;

    let message = state
        .chat_service
        .send(&conversation_id, &sender.id, content)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&message)?);
    } else if !quiet {
        println!(
            "  {} Sent as {} at {}",
            style("✓").green().bold(),
            style(&sender.username).cyan(),
            message.created_at.format("%H:%M:%S")
        );
    }

    Ok(())
}

async fn mark_read(
    state: &AppState,
    conversation: &str,
    viewer: &str,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let conversation_id = parse_conversation_id(conversation)?;
    let viewer = resolve_account(state, viewer).await?;

    let changed = state
        .chat_service
        .mark_read(&conversation_id, &viewer.id)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"conversation_id": conversation_id, "marked_read": changed})
        );
        return Ok(());
    }
    if quiet {
        return Ok(());
    }

    if changed == 0 {
        println!("  {} Nothing unread.", style("i").blue().bold());
    } else {
        println!(
            "  {} Marked {} message{} read.",
            style("✓").green().bold(),
            changed,
            if changed == 1 { "" } else { "s" }
        );
    }

    Ok(())
}

async fn summary(state: &AppState, conversation: &str, viewer: &str, json: bool) -> Result<()> {
    let conversation_id = parse_conversation_id(conversation)?;
    let viewer = resolve_account(state, viewer).await?;

    let summary = state
        .chat_service
        .summarize(&conversation_id, &viewer.id)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let partner = partner_of(state, &summary, &viewer.id).await?;

    println!();
    println!(
        "  {} {}",
        style(&partner.avatar).magenta().bold(),
        style(partner.display_name()).cyan().bold()
    );
    match &summary.last_message {
        Some(message) => println!(
            "  {}  {} ({})",
            style("Last:").bold(),
            message.preview(PREVIEW_CHARS),
            style(format_relative_time(&message.created_at)).dim()
        ),
        None => println!("  {}  {}", style("Last:").bold(), style("no messages yet").dim()),
    }
    println!("  {}  {}", style("Unread:").bold(), unread_style(summary.unread_count));
    println!();

    Ok(())
}

async fn list_conversations(state: &AppState, viewer: &str, json: bool) -> Result<()> {
    let viewer = resolve_account(state, viewer).await?;
    let summaries = state.chat_service.list_for(&viewer.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!();
        println!(
            "  {} No conversations yet. Start one with: {}",
            style("i").blue().bold(),
            style(format!("able chat open {} <other>", viewer.username)).yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("With").fg(Color::White),
        Cell::new("Last message").fg(Color::White),
        Cell::new("Unread").fg(Color::White),
        Cell::new("Active").fg(Color::White),
    ]);

    for summary in &summaries {
        let partner = partner_of(state, summary, &viewer.id).await?;
        let last = summary
            .last_message
            .as_ref()
            .map(|m| m.preview(PREVIEW_CHARS))
            .unwrap_or_default();
        let unread = if summary.unread_count > 0 {
            Cell::new(summary.unread_count).fg(Color::Green)
        } else {
            Cell::new(0).fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(short_id(&summary.conversation.id)).fg(Color::DarkGrey),
            Cell::new(partner.display_name()).fg(Color::Cyan),
            Cell::new(last),
            unread,
            Cell::new(format_relative_time(&summary.conversation.updated_at)).fg(Color::DarkGrey),
        ]);
    }

    let total_unread: u32 = summaries.iter().map(|s| s.unread_count).sum();

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} conversation{}, {} unread",
        style(summaries.len()).bold(),
        if summaries.len() == 1 { "" } else { "s" },
        unread_style(total_unread)
    );
    println!();

    Ok(())
}

async fn show_conversation(
    state: &AppState,
    conversation: &str,
    viewer: &str,
    json: bool,
) -> Result<()> {
    let conversation_id = parse_conversation_id(conversation)?;
    let viewer = resolve_account(state, viewer).await?;

    let detail = state.chat_service.open(&conversation_id, &viewer.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let name_of = |id: &AccountId| -> String {
        detail
            .participants
            .iter()
            .find(|a| a.id == *id)
            .map(|a| a.username.clone())
            .unwrap_or_else(|| short_id(id))
    };

    let partner = detail
        .participants
        .iter()
        .find(|a| a.id != viewer.id)
        .map(Account::display_name)
        .unwrap_or_default();

    println!();
    println!(
        "  {} {}",
        style("Conversation with").dim(),
        style(partner).cyan().bold()
    );
    println!("  {}", style(detail.conversation.id.to_string()).dim());
    println!();

    if detail.messages.is_empty() {
        println!("  {}", style("No messages yet.").dim());
    }
    for message in &detail.messages {
        let author = name_of(&message.sender_id);
        let author = if message.sender_id == viewer.id {
            style(author).green()
        } else {
            style(author).cyan()
        };
        println!(
            "  {} {} {}",
            style(message.created_at.format("%Y-%m-%d %H:%M")).dim(),
            author.bold(),
            message.content
        );
    }
    println!();

    Ok(())
}

/// The participant of a summarized conversation who is not `viewer`.
async fn partner_of(
    state: &AppState,
    summary: &ConversationSummary,
    viewer: &AccountId,
) -> Result<Account> {
    let partner_id = summary
        .conversation
        .participants
        .other(viewer)
        .ok_or_else(|| anyhow::anyhow!("account {viewer} is not in this conversation"))?;
    Ok(state.account_service.get(&partner_id).await?)
}

fn unread_style(count: u32) -> console::StyledObject<u32> {
    if count > 0 {
        style(count).green().bold()
    } else {
        style(count).dim()
    }
}
