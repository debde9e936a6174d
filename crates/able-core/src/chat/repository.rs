//! ChatRepository trait definition.
//!
//! Provides persistence for conversations and messages. Follows the same
//! RPITIT pattern as `AccountDirectory`.

use able_types::account::AccountId;
use able_types::chat::{Conversation, ConversationId, Message, ParticipantPair};
use able_types::error::RepositoryError;

/// Repository trait for conversation and message persistence.
///
/// Implementations live in able-infra (e.g., `SqliteChatRepository`).
/// Implementations must reject a second active conversation for the same
/// participant pair with `RepositoryError::Conflict`.
pub trait ChatRepository: Send + Sync {
    /// Find the active conversation for exactly this pair.
    fn find_active_by_pair(
        &self,
        pair: &ParticipantPair,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Insert a new conversation.
    ///
    /// Returns `Conflict` when an active conversation for the pair already exists.
    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Get a conversation by id, active or not.
    fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Active conversations the account participates in, most recently active first.
    fn list_active_for(
        &self,
        account: &AccountId,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Flag an active conversation inactive. `NotFound` if no active row matched.
    fn deactivate(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert a message and bump the conversation's `updated_at` to the
    /// message time, atomically.
    ///
    /// Returns `NotFound` (and writes nothing) if the conversation is absent
    /// or no longer active.
    fn append_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Messages in a conversation, oldest first.
    fn get_messages(
        &self,
        id: &ConversationId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Most recent message in a conversation.
    fn latest_message(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Unread messages in the conversation not sent by `viewer`.
    fn unread_count(
        &self,
        id: &ConversationId,
        viewer: &AccountId,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;

    /// Mark every unread message not sent by `viewer` as read.
    ///
    /// Returns the number of messages changed.
    fn mark_read(
        &self,
        id: &ConversationId,
        viewer: &AccountId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Every conversation, active or not, paired with its message count.
    /// Most recently active first.
    fn list_all_with_counts(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<(Conversation, u64)>, RepositoryError>> + Send;

    fn count_active_conversations(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    fn count_messages(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
