//! In-memory repository doubles shared by the service tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use able_types::account::{Account, AccountId, AccountKind, derive_avatar};
use able_types::chat::{Conversation, ConversationId, Message, ParticipantPair};
use able_types::error::RepositoryError;
use chrono::Utc;

use crate::chat::repository::ChatRepository;
use crate::repository::account::AccountDirectory;

#[derive(Default)]
pub struct InMemoryAccounts {
    accounts: Mutex<Vec<Account>>,
}

impl InMemoryAccounts {
    /// Register an account directly, bypassing validation.
    pub fn add(&self, username: &str, is_staff: bool) -> AccountId {
        let account = Account {
            id: AccountId::new(),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            kind: if is_staff {
                AccountKind::Admin
            } else {
                AccountKind::Pwd
            },
            avatar: derive_avatar("", username),
            is_staff,
            is_verified: false,
            joined_at: Utc::now(),
        };
        let id = account.id;
        self.accounts.lock().unwrap().push(account);
        id
    }
}

impl AccountDirectory for InMemoryAccounts {
    async fn create(&self, account: &Account) -> Result<Account, RepositoryError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|a| a.username == account.username) {
            return Err(RepositoryError::Conflict(format!(
                "username '{}' already exists",
                account.username
            )));
        }
        accounts.push(account.clone());
        Ok(account.clone())
    }

    async fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == *id)
            .cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn exists(&self, id: &AccountId) -> Result<bool, RepositoryError> {
        Ok(self.accounts.lock().unwrap().iter().any(|a| a.id == *id))
    }

    async fn list(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Account>, RepositoryError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .iter()
            .rev()
            .skip(offset.unwrap_or(0) as usize)
            .take(limit.map(|l| l as usize).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.accounts.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryChatRepository {
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<Vec<Message>>,
    /// Number of upcoming pair lookups that pretend nothing exists, to
    /// reproduce a lost check-then-create race.
    hidden_lookups: AtomicU32,
}

impl InMemoryChatRepository {
    pub fn hide_next_lookups(&self, n: u32) {
        self.hidden_lookups.store(n, Ordering::SeqCst);
    }

    pub fn conversation_rows(&self) -> usize {
        self.conversations.lock().unwrap().len()
    }

    pub fn messages_in(&self, id: &ConversationId) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == *id)
            .count()
    }

    /// Insert a conversation without the uniqueness check.
    pub fn insert_raw(&self, conversation: Conversation) {
        self.conversations.lock().unwrap().push(conversation);
    }
}

impl ChatRepository for InMemoryChatRepository {
    async fn find_active_by_pair(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let hidden = self
            .hidden_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if hidden {
            return Ok(None);
        }
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.is_active && c.participants == *pair)
            .cloned())
    }

    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        // Let concurrent callers finish their lookups before anyone inserts.
        tokio::task::yield_now().await;
        let mut conversations = self.conversations.lock().unwrap();
        if conversations
            .iter()
            .any(|c| c.is_active && c.participants == conversation.participants)
        {
            return Err(RepositoryError::Conflict(
                "active conversation already exists for pair".to_string(),
            ));
        }
        conversations.push(conversation.clone());
        Ok(conversation.clone())
    }

    async fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == *id)
            .cloned())
    }

    async fn list_active_for(
        &self,
        account: &AccountId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let mut found: Vec<Conversation> = self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_active && c.participants.contains(account))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn deactivate(&self, id: &ConversationId) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.lock().unwrap();
        match conversations
            .iter_mut()
            .find(|c| c.id == *id && c.is_active)
        {
            Some(c) => {
                c.is_active = false;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn append_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id && c.is_active)
            .ok_or(RepositoryError::NotFound)?;
        conversation.updated_at = message.created_at;
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn get_messages(
        &self,
        id: &ConversationId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == *id)
            .skip(offset.unwrap_or(0) as usize)
            .take(limit.map(|l| l as usize).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn latest_message(&self, id: &ConversationId) -> Result<Option<Message>, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == *id)
            .last()
            .cloned())
    }

    async fn unread_count(
        &self,
        id: &ConversationId,
        viewer: &AccountId,
    ) -> Result<u32, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == *id && !m.is_read && m.sender_id != *viewer)
            .count() as u32)
    }

    async fn mark_read(
        &self,
        id: &ConversationId,
        viewer: &AccountId,
    ) -> Result<u64, RepositoryError> {
        let mut changed = 0;
        for m in self.messages.lock().unwrap().iter_mut() {
            if m.conversation_id == *id && !m.is_read && m.sender_id != *viewer {
                m.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn list_all_with_counts(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<(Conversation, u64)>, RepositoryError> {
        let mut all = self.conversations.lock().unwrap().clone();
        all.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.0.cmp(&a.id.0))
        });
        Ok(all
            .into_iter()
            .skip(offset.unwrap_or(0) as usize)
            .take(limit.map(|l| l as usize).unwrap_or(usize::MAX))
            .map(|c| {
                let count = self.messages_in(&c.id) as u64;
                (c, count)
            })
            .collect())
    }

    async fn count_active_conversations(&self) -> Result<u64, RepositoryError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_active)
            .count() as u64)
    }

    async fn count_messages(&self) -> Result<u64, RepositoryError> {
        Ok(self.messages.lock().unwrap().len() as u64)
    }
}
