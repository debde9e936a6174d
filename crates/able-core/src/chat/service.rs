//! Chat service owning the two-party conversation lifecycle.
//!
//! ChatService coordinates the ChatRepository and the AccountDirectory:
//! locating or creating the single conversation for a pair of accounts,
//! appending messages, tracking read state, and projecting unread counts
//! and last-message previews for list views.

use std::collections::HashSet;

use able_types::account::{Account, AccountId};
use able_types::chat::{
    ChatStats, Conversation, ConversationDetail, ConversationId, ConversationOverview,
    ConversationSummary, InitiatedChat, Message, OpenedConversation, ParticipantPair,
    render_greeting,
};
use able_types::config::ChatConfig;
use able_types::error::{ChatError, RepositoryError};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::repository::account::AccountDirectory;

/// Orchestrates conversations and messages between pairs of accounts.
///
/// Generic over `ChatRepository` and `AccountDirectory` to maintain clean
/// architecture (able-core never depends on able-infra).
pub struct ChatService<C: ChatRepository, A: AccountDirectory> {
    chat_repo: C,
    accounts: A,
    config: ChatConfig,
}

impl<C: ChatRepository, A: AccountDirectory> ChatService<C, A> {
    pub fn new(chat_repo: C, accounts: A, config: ChatConfig) -> Self {
        Self {
            chat_repo,
            accounts,
            config,
        }
    }

    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    pub fn accounts(&self) -> &A {
        &self.accounts
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    // --- Conversation lookup/creation ---

    /// Return the active conversation between `a` and `b`, creating it on
    /// first contact.
    ///
    /// The pair is unordered. Uniqueness is enforced by the store; when a
    /// concurrent caller wins the insert, the winner's row is re-read once
    /// and returned. If that re-read still finds nothing the race is
    /// reported as `Conflict`.
    pub async fn get_or_create(
        &self,
        a: &AccountId,
        b: &AccountId,
    ) -> Result<OpenedConversation, ChatError> {
        let pair = ParticipantPair::new(*a, *b)?;
        for account in pair.as_array() {
            self.require_account(&account).await?;
        }

        if let Some(conversation) = self
            .chat_repo
            .find_active_by_pair(&pair)
            .await
            .map_err(storage)?
        {
            debug!(conversation_id = %conversation.id, "Found existing conversation");
            return Ok(OpenedConversation {
                conversation,
                created: false,
            });
        }

        let candidate = Conversation::start(pair);
        match self.chat_repo.create_conversation(&candidate).await {
            Ok(conversation) => {
                info!(
                    conversation_id = %conversation.id,
                    low = %pair.low(),
                    high = %pair.high(),
                    "Conversation created"
                );
                Ok(OpenedConversation {
                    conversation,
                    created: true,
                })
            }
            Err(RepositoryError::Conflict(_)) => {
                warn!(
                    low = %pair.low(),
                    high = %pair.high(),
                    "Lost conversation create race, re-fetching"
                );
                self.chat_repo
                    .find_active_by_pair(&pair)
                    .await
                    .map_err(storage)?
                    .map(|conversation| OpenedConversation {
                        conversation,
                        created: false,
                    })
                    .ok_or_else(|| {
                        ChatError::Conflict(format!(
                            "conversation between {} and {} is being created concurrently",
                            pair.low(),
                            pair.high()
                        ))
                    })
            }
            Err(e) => Err(storage(e)),
        }
    }

    // --- Messages ---

    /// Append a message from `sender` to the conversation.
    ///
    /// The message starts unread and the conversation's last-activity
    /// timestamp moves to the message time.
    pub async fn send(
        &self,
        conversation_id: &ConversationId,
        sender: &AccountId,
        content: &str,
    ) -> Result<Message, ChatError> {
        self.validate_content(content)?;
        let conversation = self.participant_conversation(conversation_id, sender).await?;

        let message = Message {
            id: Uuid::now_v7(),
            conversation_id: conversation.id,
            sender_id: *sender,
            content: content.to_string(),
            created_at: Utc::now(),
            is_read: false,
        };

        self.chat_repo
            .append_message(&message)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => conversation_not_found(conversation_id),
                other => storage(other),
            })?;

        debug!(conversation_id = %conversation_id, message_id = %message.id, "Message sent");
        Ok(message)
    }

    /// Mark every message from the other participant as read for `viewer`.
    ///
    /// Returns how many messages changed; zero is not an error.
    pub async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        viewer: &AccountId,
    ) -> Result<u64, ChatError> {
        self.participant_conversation(conversation_id, viewer).await?;

        let changed = self
            .chat_repo
            .mark_read(conversation_id, viewer)
            .await
            .map_err(storage)?;

        debug!(conversation_id = %conversation_id, viewer = %viewer, changed, "Marked messages read");
        Ok(changed)
    }

    /// Last message and unread count of a conversation, as seen by `viewer`.
    pub async fn summarize(
        &self,
        conversation_id: &ConversationId,
        viewer: &AccountId,
    ) -> Result<ConversationSummary, ChatError> {
        let conversation = self.participant_conversation(conversation_id, viewer).await?;
        self.summary_of(conversation, viewer).await
    }

    // --- Views ---

    /// Summaries of every active conversation `viewer` takes part in,
    /// most recently active first.
    pub async fn list_for(&self, viewer: &AccountId) -> Result<Vec<ConversationSummary>, ChatError> {
        self.require_account(viewer).await?;

        let conversations = self
            .chat_repo
            .list_active_for(viewer)
            .await
            .map_err(storage)?;

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            summaries.push(self.summary_of(conversation, viewer).await?);
        }
        Ok(summaries)
    }

    /// Open the detail view: marks the conversation read for `viewer`, then
    /// returns both participants and the full history.
    pub async fn open(
        &self,
        conversation_id: &ConversationId,
        viewer: &AccountId,
    ) -> Result<ConversationDetail, ChatError> {
        let conversation = self.participant_conversation(conversation_id, viewer).await?;

        self.chat_repo
            .mark_read(conversation_id, viewer)
            .await
            .map_err(storage)?;

        let participants = self.participants_of(&conversation).await?;

        let messages = self
            .chat_repo
            .get_messages(conversation_id, None, None)
            .await
            .map_err(storage)?;

        Ok(ConversationDetail {
            conversation,
            participants,
            messages,
        })
    }

    // --- Administration ---

    /// Flag a conversation inactive. It disappears from participants' views
    /// and a later `get_or_create` for the pair starts a new one.
    pub async fn deactivate(&self, conversation_id: &ConversationId) -> Result<(), ChatError> {
        self.chat_repo
            .deactivate(conversation_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => conversation_not_found(conversation_id),
                other => storage(other),
            })?;

        info!(conversation_id = %conversation_id, "Conversation deactivated");
        Ok(())
    }

    /// Open a conversation from a staff account to each target, greeting
    /// the ones that are newly created.
    ///
    /// Duplicate targets and the admin itself are skipped. Every target is
    /// resolved and every greeting validated before anything is written, so
    /// an unknown target leaves the store untouched. `greeting` defaults to
    /// `ChatConfig::admin_greeting`; `{username}` is replaced per target.
    pub async fn initiate(
        &self,
        admin: &AccountId,
        targets: &[AccountId],
        greeting: Option<&str>,
    ) -> Result<Vec<InitiatedChat>, ChatError> {
        let admin_account = self.require_staff(admin).await?;
        let template = greeting.unwrap_or(self.config.admin_greeting.as_str());
        self.initiate_with(&admin_account, targets, template).await
    }

    /// Open an admin chat with every participant of the given conversations.
    ///
    /// Conversations may be inactive. `greeting` defaults to
    /// `ChatConfig::followup_greeting`.
    pub async fn initiate_from_conversations(
        &self,
        admin: &AccountId,
        conversation_ids: &[ConversationId],
        greeting: Option<&str>,
    ) -> Result<Vec<InitiatedChat>, ChatError> {
        let admin_account = self.require_staff(admin).await?;

        let mut targets = Vec::new();
        for conversation_id in conversation_ids {
            let conversation = self
                .chat_repo
                .get_conversation(conversation_id)
                .await
                .map_err(storage)?
                .ok_or_else(|| conversation_not_found(conversation_id))?;
            targets.extend(conversation.participants.as_array());
        }

        let template = greeting.unwrap_or(self.config.followup_greeting.as_str());
        self.initiate_with(&admin_account, &targets, template).await
    }

    /// Every conversation, active or not, with participants and message
    /// counts, most recently active first.
    pub async fn overview(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ConversationOverview>, ChatError> {
        let rows = self
            .chat_repo
            .list_all_with_counts(limit, offset)
            .await
            .map_err(storage)?;

        let mut overview = Vec::with_capacity(rows.len());
        for (conversation, message_count) in rows {
            let participants = self.participants_of(&conversation).await?;
            overview.push(ConversationOverview {
                conversation,
                participants,
                message_count,
            });
        }
        Ok(overview)
    }

    /// Platform-wide counters for the status dashboard.
    pub async fn stats(&self) -> Result<ChatStats, ChatError> {
        Ok(ChatStats {
            accounts: self.accounts.count().await.map_err(storage)?,
            active_conversations: self
                .chat_repo
                .count_active_conversations()
                .await
                .map_err(storage)?,
            messages: self.chat_repo.count_messages().await.map_err(storage)?,
        })
    }

    // --- Helpers ---

    async fn initiate_with(
        &self,
        admin: &Account,
        targets: &[AccountId],
        template: &str,
    ) -> Result<Vec<InitiatedChat>, ChatError> {
        let mut seen = HashSet::new();
        let mut planned = Vec::new();
        for target in targets {
            if *target == admin.id || !seen.insert(*target) {
                debug!(target = %target, "Skipping initiation target");
                continue;
            }
            let account = self
                .accounts
                .get_by_id(target)
                .await
                .map_err(storage)?
                .ok_or_else(|| ChatError::NotFound(format!("account {target} not found")))?;
            let greeting = render_greeting(template, &account.username);
            self.validate_content(&greeting)?;
            planned.push((account.id, greeting));
        }

        let mut initiated = Vec::with_capacity(planned.len());
        for (target, greeting) in planned {
            let opened = self.get_or_create(&admin.id, &target).await?;
            let message = if opened.created {
                Some(self.send(&opened.conversation.id, &admin.id, &greeting).await?)
            } else {
                None
            };
            initiated.push(InitiatedChat {
                conversation_id: opened.conversation.id,
                target,
                created: opened.created,
                message,
            });
        }

        let greeted = initiated.iter().filter(|c| c.created).count();
        info!(admin = %admin.id, targets = initiated.len(), greeted, "Admin chats initiated");
        Ok(initiated)
    }

    async fn require_staff(&self, id: &AccountId) -> Result<Account, ChatError> {
        let account = self
            .accounts
            .get_by_id(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| ChatError::NotFound(format!("account {id} not found")))?;

        if !account.is_staff {
            return Err(ChatError::Forbidden(format!(
                "'{}' is not a staff account",
                account.username
            )));
        }
        Ok(account)
    }

    async fn participants_of(&self, conversation: &Conversation) -> Result<Vec<Account>, ChatError> {
        let mut participants = Vec::with_capacity(2);
        for id in conversation.participants.as_array() {
            let account = self
                .accounts
                .get_by_id(&id)
                .await
                .map_err(storage)?
                .ok_or_else(|| ChatError::NotFound(format!("account {id} not found")))?;
            participants.push(account);
        }
        Ok(participants)
    }

    async fn require_account(&self, id: &AccountId) -> Result<(), ChatError> {
        if self.accounts.exists(id).await.map_err(storage)? {
            Ok(())
        } else {
            Err(ChatError::NotFound(format!("account {id} not found")))
        }
    }

    /// Load an active conversation and check `account` takes part in it.
    async fn participant_conversation(
        &self,
        conversation_id: &ConversationId,
        account: &AccountId,
    ) -> Result<Conversation, ChatError> {
        let conversation = self
            .chat_repo
            .get_conversation(conversation_id)
            .await
            .map_err(storage)?
            .filter(|c| c.is_active)
            .ok_or_else(|| conversation_not_found(conversation_id))?;

        if !conversation.participants.contains(account) {
            return Err(ChatError::Forbidden(format!(
                "account {account} is not a participant of conversation {conversation_id}"
            )));
        }

        Ok(conversation)
    }

    async fn summary_of(
        &self,
        conversation: Conversation,
        viewer: &AccountId,
    ) -> Result<ConversationSummary, ChatError> {
        let last_message = self
            .chat_repo
            .latest_message(&conversation.id)
            .await
            .map_err(storage)?;
        let unread_count = self
            .chat_repo
            .unread_count(&conversation.id, viewer)
            .await
            .map_err(storage)?;

        Ok(ConversationSummary {
            conversation,
            last_message,
            unread_count,
        })
    }

    fn validate_content(&self, content: &str) -> Result<(), ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::InvalidArgument(
                "message content cannot be empty".to_string(),
            ));
        }
        let max = self.config.max_message_length;
        if content.chars().count() > max {
            return Err(ChatError::InvalidArgument(format!(
                "message content exceeds {max} characters"
            )));
        }
        Ok(())
    }
}

fn storage(e: RepositoryError) -> ChatError {
    ChatError::Storage(e.to_string())
}

fn conversation_not_found(id: &ConversationId) -> ChatError {
    ChatError::NotFound(format!("conversation {id} not found"))
}
