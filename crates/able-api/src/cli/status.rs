//! System status dashboard command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display counts of accounts, active conversations and messages, plus
/// the effective configuration.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let stats = state.chat_service.stats().await?;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "stats": stats,
            "config": state.config,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Able Connect v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Chat ──").dim());
    println!("  Accounts:      {}", style(stats.accounts).bold());
    println!("  Conversations: {}", style(stats.active_conversations).green());
    println!("  Messages:      {}", stats.messages);
    println!();

    println!("  {}", style("── Limits ──").dim());
    println!(
        "  Max message:   {} chars",
        state.config.chat.max_message_length
    );
    println!(
        "  Greeting:      {}",
        style(&state.config.chat.admin_greeting).dim()
    );
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!(
        "  Database: {}",
        style(format!(
            "SQLite (WAL mode, {} readers)",
            state.config.database.max_readers
        ))
        .dim()
    );
    println!();

    Ok(())
}
