//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `able-core` using sqlx with split
//! read/write pools. Pair uniqueness is enforced by the partial unique index
//! `idx_conversations_active_pair`; a violating insert surfaces as
//! `RepositoryError::Conflict`.

use able_core::chat::repository::ChatRepository;
use able_types::account::AccountId;
use able_types::chat::{Conversation, ConversationId, Message, ParticipantPair};
use able_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, map_write_error, parse_datetime};

/// SQLite-backed implementation of `ChatRepository`.
#[derive(Clone)]
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    participant_low: String,
    participant_high: String,
    created_at: String,
    updated_at: String,
    is_active: bool,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            participant_low: row.try_get("participant_low")?,
            participant_high: row.try_get("participant_high")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            is_active: row.try_get("is_active")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        let id = parse_uuid(&self.id, "conversation id")?;
        let low = parse_uuid(&self.participant_low, "participant_low")?;
        let high = parse_uuid(&self.participant_high, "participant_high")?;
        let participants =
            ParticipantPair::new(AccountId::from_uuid(low), AccountId::from_uuid(high))
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Conversation {
            id: ConversationId(id),
            participants,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            is_active: self.is_active,
        })
    }
}

struct MessageRow {
    id: String,
    conversation_id: String,
    sender_id: String,
    content: String,
    created_at: String,
    is_read: bool,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            sender_id: row.try_get("sender_id")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            is_read: row.try_get("is_read")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        Ok(Message {
            id: parse_uuid(&self.id, "message id")?,
            conversation_id: ConversationId(parse_uuid(&self.conversation_id, "conversation_id")?),
            sender_id: AccountId::from_uuid(parse_uuid(&self.sender_id, "sender_id")?),
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
            is_read: self.is_read,
        })
    }
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

fn map_conversation(row: &sqlx::sqlite::SqliteRow) -> Result<Conversation, RepositoryError> {
    ConversationRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_conversation()
}

fn map_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, RepositoryError> {
    MessageRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_message()
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn count_to_u32(count: i64) -> Result<u32, RepositoryError> {
    u32::try_from(count).map_err(|e| RepositoryError::Query(format!("count {count} out of range: {e}")))
}

fn count_to_u64(count: i64) -> Result<u64, RepositoryError> {
    u64::try_from(count).map_err(|e| RepositoryError::Query(format!("count {count} out of range: {e}")))
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn find_active_by_pair(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM conversations WHERE participant_low = ? AND participant_high = ? AND is_active = 1",
        )
        .bind(pair.low().to_string())
        .bind(pair.high().to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        row.as_ref().map(map_conversation).transpose()
    }

    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO conversations (id, participant_low, participant_high, created_at, updated_at, is_active)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.participants.low().to_string())
        .bind(conversation.participants.high().to_string())
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .bind(conversation.is_active)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            map_write_error(e, || {
                format!(
                    "active conversation already exists for {} and {}",
                    conversation.participants.low(),
                    conversation.participants.high()
                )
            })
        })?;

        Ok(conversation.clone())
    }

    async fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        row.as_ref().map(map_conversation).transpose()
    }

    async fn list_active_for(
        &self,
        account: &AccountId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let account = account.to_string();
        let rows = sqlx::query(
            r#"SELECT * FROM conversations
               WHERE is_active = 1 AND (participant_low = ? OR participant_high = ?)
               ORDER BY updated_at DESC, id DESC"#,
        )
        .bind(&account)
        .bind(&account)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter().map(map_conversation).collect()
    }

    async fn deactivate(&self, id: &ConversationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE conversations SET is_active = 0 WHERE id = ? AND is_active = 1")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn append_message(&self, message: &Message) -> Result<(), RepositoryError> {
        // Bump last activity and insert in one transaction; the guarded
        // UPDATE also rejects conversations deactivated since the caller
        // looked them up.
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let bumped = sqlx::query(
            "UPDATE conversations SET updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(format_datetime(&message.created_at))
        .bind(message.conversation_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        if bumped.rows_affected() == 0 {
            tx.rollback().await.map_err(query_err)?;
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r#"INSERT INTO messages (id, conversation_id, sender_id, content, created_at, is_read)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.sender_id.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .bind(message.is_read)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Ok(())
    }

    async fn get_messages(
        &self,
        id: &ConversationId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let mut sql = String::from(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, id ASC",
        );

        // SQLite needs a LIMIT before OFFSET; -1 means unbounded.
        if limit.is_some() || offset.is_some() {
            sql.push_str(&format!(" LIMIT {}", limit.unwrap_or(-1)));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let rows = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        rows.iter().map(map_message).collect()
    }

    async fn latest_message(&self, id: &ConversationId) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        row.as_ref().map(map_message).transpose()
    }

    async fn unread_count(
        &self,
        id: &ConversationId,
        viewer: &AccountId,
    ) -> Result<u32, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM messages WHERE conversation_id = ? AND is_read = 0 AND sender_id != ?",
        )
        .bind(id.to_string())
        .bind(viewer.to_string())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let count: i64 = row.try_get("cnt").map_err(query_err)?;
        count_to_u32(count)
    }

    async fn mark_read(
        &self,
        id: &ConversationId,
        viewer: &AccountId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = 1 WHERE conversation_id = ? AND is_read = 0 AND sender_id != ?",
        )
        .bind(id.to_string())
        .bind(viewer.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(result.rows_affected())
    }

    async fn list_all_with_counts(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<(Conversation, u64)>, RepositoryError> {
        let mut sql = String::from(
            r#"SELECT c.*,
                      (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id) AS message_count
               FROM conversations c
               ORDER BY c.updated_at DESC, c.id DESC"#,
        );
        // SQLite needs a LIMIT before OFFSET; -1 means unbounded.
        if limit.is_some() || offset.is_some() {
            sql.push_str(&format!(" LIMIT {}", limit.unwrap_or(-1)));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        rows.iter()
            .map(|row| {
                let count: i64 = row.try_get("message_count").map_err(query_err)?;
                Ok((map_conversation(row)?, count_to_u64(count)?))
            })
            .collect()
    }

    async fn count_active_conversations(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM conversations WHERE is_active = 1")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let count: i64 = row.try_get("cnt").map_err(query_err)?;
        count_to_u64(count)
    }

    async fn count_messages(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM messages")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let count: i64 = row.try_get("cnt").map_err(query_err)?;
        count_to_u64(count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use able_core::chat::service::ChatService;
    use able_core::repository::account::AccountDirectory;
    use able_types::config::ChatConfig;
    use able_types::error::ChatError;
    use chrono::Utc;

    use super::*;
    use crate::sqlite::account::SqliteAccountRepository;
    use crate::sqlite::account::test_support::make_account;
    use crate::sqlite::pool::test_support::test_pool;

    struct Fixture {
        repo: SqliteChatRepository,
        accounts: SqliteAccountRepository,
        a: AccountId,
        b: AccountId,
    }

    async fn fixture() -> Fixture {
        let pool = test_pool().await;
        let accounts = SqliteAccountRepository::new(pool.clone());
        let a = make_account("alia");
        let b = make_account("badr");
        accounts.create(&a).await.unwrap();
        accounts.create(&b).await.unwrap();
        Fixture {
            repo: SqliteChatRepository::new(pool),
            accounts,
            a: a.id,
            b: b.id,
        }
    }

    fn make_message(conversation_id: ConversationId, sender: AccountId, content: &str) -> Message {
        Message {
            id: Uuid::now_v7(),
            conversation_id,
            sender_id: sender,
            content: content.to_string(),
            created_at: Utc::now(),
            is_read: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_pair() {
        let f = fixture().await;
        let pair = ParticipantPair::new(f.a, f.b).unwrap();
        let conv = Conversation::start(pair);

        f.repo.create_conversation(&conv).await.unwrap();

        let reversed = ParticipantPair::new(f.b, f.a).unwrap();
        let found = f.repo.find_active_by_pair(&reversed).await.unwrap().unwrap();
        assert_eq!(found.id, conv.id);
        assert_eq!(found.participants, pair);
        assert_eq!(found.created_at, conv.created_at);
        assert!(found.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_active_pair_conflicts() {
        let f = fixture().await;
        let pair = ParticipantPair::new(f.a, f.b).unwrap();
        f.repo
            .create_conversation(&Conversation::start(pair))
            .await
            .unwrap();

        let err = f
            .repo
            .create_conversation(&Conversation::start(pair))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_inactive_pair_allows_new_conversation() {
        let f = fixture().await;
        let pair = ParticipantPair::new(f.a, f.b).unwrap();
        let old = Conversation::start(pair);
        f.repo.create_conversation(&old).await.unwrap();
        f.repo.deactivate(&old.id).await.unwrap();

        assert!(f.repo.find_active_by_pair(&pair).await.unwrap().is_none());
        let new = Conversation::start(pair);
        f.repo.create_conversation(&new).await.unwrap();

        let found = f.repo.find_active_by_pair(&pair).await.unwrap().unwrap();
        assert_eq!(found.id, new.id);

        let err = f.repo.deactivate(&old.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_append_message_bumps_updated_at() {
        let f = fixture().await;
        let conv = Conversation::start(ParticipantPair::new(f.a, f.b).unwrap());
        f.repo.create_conversation(&conv).await.unwrap();

        let msg = make_message(conv.id, f.a, "hello");
        f.repo.append_message(&msg).await.unwrap();

        let stored = f.repo.get_conversation(&conv.id).await.unwrap().unwrap();
        assert_eq!(stored.updated_at, msg.created_at);

        let latest = f.repo.latest_message(&conv.id).await.unwrap().unwrap();
        assert_eq!(latest.id, msg.id);
        assert_eq!(latest.content, "hello");
        assert!(!latest.is_read);
    }

    #[tokio::test]
    async fn test_append_to_inactive_conversation_writes_nothing() {
        let f = fixture().await;
        let conv = Conversation::start(ParticipantPair::new(f.a, f.b).unwrap());
        f.repo.create_conversation(&conv).await.unwrap();
        f.repo.deactivate(&conv.id).await.unwrap();

        let err = f
            .repo
            .append_message(&make_message(conv.id, f.a, "late"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(f.repo.count_messages().await.unwrap(), 0);

        let err = f
            .repo
            .append_message(&make_message(ConversationId::new(), f.a, "nowhere"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_unread_and_mark_read() {
        let f = fixture().await;
        let conv = Conversation::start(ParticipantPair::new(f.a, f.b).unwrap());
        f.repo.create_conversation(&conv).await.unwrap();
        f.repo.append_message(&make_message(conv.id, f.a, "one")).await.unwrap();
        f.repo.append_message(&make_message(conv.id, f.a, "two")).await.unwrap();
        f.repo.append_message(&make_message(conv.id, f.b, "back")).await.unwrap();

        assert_eq!(f.repo.unread_count(&conv.id, &f.b).await.unwrap(), 2);
        assert_eq!(f.repo.unread_count(&conv.id, &f.a).await.unwrap(), 1);

        assert_eq!(f.repo.mark_read(&conv.id, &f.b).await.unwrap(), 2);
        assert_eq!(f.repo.mark_read(&conv.id, &f.b).await.unwrap(), 0);
        assert_eq!(f.repo.unread_count(&conv.id, &f.b).await.unwrap(), 0);
        assert_eq!(f.repo.unread_count(&conv.id, &f.a).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_messages_ordered_with_pagination() {
        let f = fixture().await;
        let conv = Conversation::start(ParticipantPair::new(f.a, f.b).unwrap());
        f.repo.create_conversation(&conv).await.unwrap();
        for text in ["first", "second", "third"] {
            f.repo.append_message(&make_message(conv.id, f.a, text)).await.unwrap();
        }

        let all = f.repo.get_messages(&conv.id, None, None).await.unwrap();
        let contents: Vec<&str> = all.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);

        let page = f.repo.get_messages(&conv.id, Some(1), Some(1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].content, "second");
    }

    #[tokio::test]
    async fn test_list_active_for_orders_by_activity() {
        let f = fixture().await;
        let c = make_account("cyra");
        f.accounts.create(&c).await.unwrap();

        let ab = Conversation::start(ParticipantPair::new(f.a, f.b).unwrap());
        let ac = Conversation::start(ParticipantPair::new(f.a, c.id).unwrap());
        f.repo.create_conversation(&ab).await.unwrap();
        f.repo.create_conversation(&ac).await.unwrap();
        f.repo.append_message(&make_message(ab.id, f.b, "ping")).await.unwrap();

        let listed = f.repo.list_active_for(&f.a).await.unwrap();
        let ids: Vec<ConversationId> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![ab.id, ac.id]);

        assert_eq!(f.repo.list_active_for(&c.id).await.unwrap().len(), 1);
        assert_eq!(f.repo.count_active_conversations().await.unwrap(), 2);
    }

    #[test]
    fn test_count_conversion_rejects_out_of_range() {
        assert_eq!(count_to_u32(7).unwrap(), 7);
        assert!(matches!(
            count_to_u32(i64::from(u32::MAX) + 1),
            Err(RepositoryError::Query(_))
        ));
        assert!(matches!(count_to_u32(-1), Err(RepositoryError::Query(_))));
        assert!(matches!(count_to_u64(-1), Err(RepositoryError::Query(_))));
    }

    #[tokio::test]
    async fn test_list_all_with_counts_includes_inactive() {
        let f = fixture().await;
        let c = make_account("cyra");
        f.accounts.create(&c).await.unwrap();

        let ab = Conversation::start(ParticipantPair::new(f.a, f.b).unwrap());
        let ac = Conversation::start(ParticipantPair::new(f.a, c.id).unwrap());
        f.repo.create_conversation(&ab).await.unwrap();
        f.repo.create_conversation(&ac).await.unwrap();
        f.repo.append_message(&make_message(ab.id, f.a, "one")).await.unwrap();
        f.repo.append_message(&make_message(ab.id, f.b, "two")).await.unwrap();
        f.repo.deactivate(&ac.id).await.unwrap();

        let all = f.repo.list_all_with_counts(None, None).await.unwrap();
        let rows: Vec<(ConversationId, bool, u64)> = all
            .iter()
            .map(|(conv, count)| (conv.id, conv.is_active, *count))
            .collect();
        assert_eq!(rows, vec![(ab.id, true, 2), (ac.id, false, 0)]);

        let page = f.repo.list_all_with_counts(Some(1), Some(1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].0.id, ac.id);
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create_yields_one_row() {
        let f = fixture().await;
        let service = Arc::new(ChatService::new(
            f.repo.clone(),
            f.accounts.clone(),
            ChatConfig::default(),
        ));

        let mut handles = Vec::new();
        for i in 0..16 {
            let service = Arc::clone(&service);
            let (a, b) = if i % 2 == 0 { (f.a, f.b) } else { (f.b, f.a) };
            handles.push(tokio::spawn(async move {
                service.get_or_create(&a, &b).await
            }));
        }

        let mut ids = Vec::new();
        let mut created = 0;
        for handle in handles {
            let opened = handle.await.unwrap().unwrap();
            if opened.created {
                created += 1;
            }
            ids.push(opened.conversation.id);
        }

        assert_eq!(created, 1);
        assert!(ids.iter().all(|id| *id == ids[0]));

        let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
            .fetch_one(&f.repo.pool.reader)
            .await
            .unwrap();
        assert_eq!(rows.0, 1);
    }

    #[tokio::test]
    async fn test_service_round_trip_over_sqlite() {
        let f = fixture().await;
        let service = ChatService::new(f.repo.clone(), f.accounts.clone(), ChatConfig::default());

        let conv = service.get_or_create(&f.a, &f.b).await.unwrap().conversation;
        service.send(&conv.id, &f.a, "hi").await.unwrap();

        let summary = service.summarize(&conv.id, &f.b).await.unwrap();
        assert_eq!(summary.unread_count, 1);
        assert_eq!(summary.last_message.unwrap().content, "hi");

        let detail = service.open(&conv.id, &f.b).await.unwrap();
        assert_eq!(detail.participants.len(), 2);
        assert!(detail.messages.iter().all(|m| m.is_read));

        service.deactivate(&conv.id).await.unwrap();
        let err = service.send(&conv.id, &f.a, "gone").await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }
}
