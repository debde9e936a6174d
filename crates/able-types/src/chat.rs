//! Conversation and message types for Able Connect.
//!
//! A conversation is the single durable channel between exactly two
//! accounts. Messages belong to one conversation and only ever change by
//! flipping their read flag from false to true.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::account::{Account, AccountId};
use crate::error::ChatError;

/// Unique identifier for a conversation (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The unordered pair of accounts in a conversation, stored canonically.
///
/// `low < high` always holds, so `{A, B}` and `{B, A}` produce the same
/// value and the same storage key. A pair of identical accounts cannot be
/// constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantPair {
    low: AccountId,
    high: AccountId,
}

impl ParticipantPair {
    /// Build the canonical pair for two accounts.
    pub fn new(a: AccountId, b: AccountId) -> Result<Self, ChatError> {
        if a == b {
            return Err(ChatError::InvalidArgument(
                "a conversation needs two distinct accounts".to_string(),
            ));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { low, high })
    }

    pub fn low(&self) -> AccountId {
        self.low
    }

    pub fn high(&self) -> AccountId {
        self.high
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.low == *account || self.high == *account
    }

    /// The participant that is not `account`, if `account` is in the pair.
    pub fn other(&self, account: &AccountId) -> Option<AccountId> {
        if self.low == *account {
            Some(self.high)
        } else if self.high == *account {
            Some(self.low)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> [AccountId; 2] {
        [self.low, self.high]
    }
}

/// A two-party conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: ParticipantPair,
    pub created_at: DateTime<Utc>,
    /// Last activity; bumped whenever a message is appended.
    pub updated_at: DateTime<Utc>,
    /// Inactive conversations are never returned to participants and never
    /// become active again.
    pub is_active: bool,
}

impl Conversation {
    /// A fresh, active conversation for the given pair.
    pub fn start(participants: ParticipantPair) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            participants,
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }
}

/// A single message within a conversation.
///
/// Messages are ordered by `created_at` (ties broken by the time-sortable id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub sender_id: AccountId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl Message {
    /// Content shortened to `max` characters, with an ellipsis when cut.
    pub fn preview(&self, max: usize) -> String {
        if self.content.chars().count() > max {
            let cut: String = self.content.chars().take(max).collect();
            format!("{cut}...")
        } else {
            self.content.clone()
        }
    }
}

/// Result of a lookup-or-create: the conversation and whether it was new.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenedConversation {
    pub conversation: Conversation,
    pub created: bool,
}

/// List-view projection of a conversation relative to one viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub last_message: Option<Message>,
    /// Messages not yet read that were sent by the other participant.
    pub unread_count: u32,
}

/// Full view of a conversation: participants and the whole history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub participants: Vec<Account>,
    pub messages: Vec<Message>,
}

/// Outcome of one target in an administrative bulk chat initiation.
///
/// A greeting is only sent when the conversation was newly created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatedChat {
    pub conversation_id: ConversationId,
    pub target: AccountId,
    pub created: bool,
    pub message: Option<Message>,
}

/// Staff listing row: a conversation, active or not, with its participants
/// and message count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationOverview {
    pub conversation: Conversation,
    pub participants: Vec<Account>,
    pub message_count: u64,
}

/// Substitute `{username}` in an admin greeting template.
///
/// # Examples
///
/// ```
/// use able_types::chat::render_greeting;
///
/// assert_eq!(render_greeting("Hello {username}!", "noor"), "Hello noor!");
/// assert_eq!(render_greeting("Hi all", "noor"), "Hi all");
/// ```
pub fn render_greeting(template: &str, username: &str) -> String {
    template.replace("{username}", username)
}

/// Platform-wide chat counters for the status dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatStats {
    pub accounts: u64,
    pub active_conversations: u64,
    pub messages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_unordered() {
        let a = AccountId::new();
        let b = AccountId::new();
        assert_eq!(
            ParticipantPair::new(a, b).unwrap(),
            ParticipantPair::new(b, a).unwrap()
        );
    }

    #[test]
    fn test_pair_is_canonical() {
        let a = AccountId::new();
        let b = AccountId::new();
        let pair = ParticipantPair::new(b, a).unwrap();
        assert!(pair.low() < pair.high());
    }

    #[test]
    fn test_pair_rejects_self() {
        let a = AccountId::new();
        let err = ParticipantPair::new(a, a).unwrap_err();
        assert!(matches!(err, ChatError::InvalidArgument(_)));
    }

    #[test]
    fn test_pair_other() {
        let a = AccountId::new();
        let b = AccountId::new();
        let c = AccountId::new();
        let pair = ParticipantPair::new(a, b).unwrap();
        assert_eq!(pair.other(&a), Some(b));
        assert_eq!(pair.other(&b), Some(a));
        assert_eq!(pair.other(&c), None);
        assert!(!pair.contains(&c));
    }

    #[test]
    fn test_message_preview() {
        let msg = Message {
            id: Uuid::now_v7(),
            conversation_id: ConversationId::new(),
            sender_id: AccountId::new(),
            content: "héllo world".to_string(),
            created_at: Utc::now(),
            is_read: false,
        };
        assert_eq!(msg.preview(5), "héllo...");
        assert_eq!(msg.preview(50), "héllo world");
    }

    #[test]
    fn test_conversation_serialize() {
        let pair = ParticipantPair::new(AccountId::new(), AccountId::new()).unwrap();
        let conversation = Conversation::start(pair);
        let json = serde_json::to_string(&conversation).unwrap();
        assert!(json.contains("\"is_active\":true"));
        assert!(json.contains("\"low\""));
    }

    #[test]
    fn test_render_greeting_substitutes_every_placeholder() {
        let rendered = render_greeting("Hi {username}! ({username})", "dina");
        assert_eq!(rendered, "Hi dina! (dina)");
    }
}
