//! SQLite account repository implementation.
//!
//! Implements `AccountDirectory` from `able-core` using sqlx with split
//! read/write pools: raw queries, a private Row struct, reader for SELECT,
//! writer for INSERT.

use able_core::repository::account::AccountDirectory;
use able_types::account::{Account, AccountId, AccountKind};
use able_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, map_write_error, parse_datetime};

/// SQLite-backed implementation of `AccountDirectory`.
#[derive(Clone)]
pub struct SqliteAccountRepository {
    pool: DatabasePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Account.
struct AccountRow {
    id: String,
    username: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    kind: String,
    avatar: String,
    is_staff: bool,
    is_verified: bool,
    joined_at: String,
}

impl AccountRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            kind: row.try_get("kind")?,
            avatar: row.try_get("avatar")?,
            is_staff: row.try_get("is_staff")?,
            is_verified: row.try_get("is_verified")?,
            joined_at: row.try_get("joined_at")?,
        })
    }

    fn into_account(self) -> Result<Account, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid account id: {e}")))?;
        let kind: AccountKind = self
            .kind
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Account {
            id: AccountId::from_uuid(id),
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            kind,
            avatar: self.avatar,
            is_staff: self.is_staff,
            is_verified: self.is_verified,
            joined_at: parse_datetime(&self.joined_at)?,
        })
    }
}

fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<Account, RepositoryError> {
    AccountRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_account()
}

impl AccountDirectory for SqliteAccountRepository {
    async fn create(&self, account: &Account) -> Result<Account, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO accounts (id, username, first_name, last_name, email, kind, avatar, is_staff, is_verified, joined_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(account.id.to_string())
        .bind(&account.username)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.email)
        .bind(account.kind.to_string())
        .bind(&account.avatar)
        .bind(account.is_staff)
        .bind(account.is_verified)
        .bind(format_datetime(&account.joined_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            map_write_error(e, || format!("username '{}' already exists", account.username))
        })?;

        Ok(account.clone())
    }

    async fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(map_row).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(map_row).transpose()
    }

    async fn exists(&self, id: &AccountId) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = ?) AS present")
            .bind(id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.try_get::<bool, _>("present")
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn list(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Account>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM accounts ORDER BY joined_at DESC, id DESC");

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
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(map_row).collect()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM accounts")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }
}
