//! Global configuration types for Able Connect.
//!
//! `AbleConfig` represents the top-level `config.toml` in the data directory.
//! Every field has a default, so an empty or missing file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbleConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

/// SQLite connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connections in the read-only pool.
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,

    /// How long a connection waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_max_readers() -> u32 {
    8
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_readers: default_max_readers(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

/// Chat behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Longest accepted message, in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    /// Message sent by `admin initiate` to a newly opened chat when none is
    /// given. `{username}` is replaced by the target's username.
    #[serde(default = "default_admin_greeting")]
    pub admin_greeting: String,

    /// Greeting used when initiating from the participants of existing
    /// conversations. Same placeholder.
    #[serde(default = "default_followup_greeting")]
    pub followup_greeting: String,
}

fn default_max_message_length() -> usize {
    5000
}

fn default_admin_greeting() -> String {
    "Hello {username}, this is an admin message. How can we help you today?".to_string()
}

fn default_followup_greeting() -> String {
    "Hello {username}, this is an admin message regarding your recent activity.".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: default_max_message_length(),
            admin_greeting: default_admin_greeting(),
            followup_greeting: default_followup_greeting(),
        }
    }
}
