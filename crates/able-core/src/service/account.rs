//! Account registration and lookup.

use able_types::account::{Account, AccountId, NewAccount, derive_avatar, normalize_username};
use able_types::error::{AccountError, RepositoryError};

use crate::repository::account::AccountDirectory;

/// Service owning account registration rules.
pub struct AccountService<A: AccountDirectory> {
    directory: A,
}

impl<A: AccountDirectory> AccountService<A> {
    pub fn new(directory: A) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &A {
        &self.directory
    }

    /// Register a new account.
    ///
    /// The username is trimmed and validated; blank optional fields are
    /// stored empty and the avatar is derived from the first name.
    pub async fn register(&self, request: NewAccount) -> Result<Account, AccountError> {
        let username = normalize_username(&request.username).map_err(AccountError::InvalidUsername)?;
        let first_name = request.first_name.trim().to_string();
        let last_name = request.last_name.trim().to_string();
        let email = request
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        let account = Account {
            id: AccountId::new(),
            avatar: derive_avatar(&first_name, &username),
            username,
            first_name,
            last_name,
            email,
            kind: request.kind.unwrap_or_default(),
            is_staff: request.is_staff,
            is_verified: false,
            joined_at: chrono::Utc::now(),
        };

        let account = self
            .directory
            .create(&account)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AccountError::UsernameTaken(account.username.clone()),
                other => AccountError::Storage(other.to_string()),
            })?;

        tracing::info!(account_id = %account.id, username = %account.username, "Account registered");
        Ok(account)
    }

    pub async fn get(&self, id: &AccountId) -> Result<Account, AccountError> {
        self.directory
            .get_by_id(id)
            .await
            .map_err(|e| AccountError::Storage(e.to_string()))?
            .ok_or(AccountError::NotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Account, AccountError> {
        self.directory
            .get_by_username(username.trim())
            .await
            .map_err(|e| AccountError::Storage(e.to_string()))?
            .ok_or(AccountError::NotFound)
    }

    /// Resolve an account by UUID or, failing that, by username.
    pub async fn resolve(&self, id_or_username: &str) -> Result<Account, AccountError> {
        if let Ok(id) = id_or_username.parse::<AccountId>() {
            return self.get(&id).await;
        }
        self.get_by_username(id_or_username).await
    }

    pub async fn list(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Account>, AccountError> {
        self.directory
            .list(limit, offset)
            .await
            .map_err(|e| AccountError::Storage(e.to_string()))
    }

    pub async fn count(&self) -> Result<u64, AccountError> {
        self.directory
            .count()
            .await
            .map_err(|e| AccountError::Storage(e.to_string()))
    }
}
