//! Account directory trait definition.

use able_types::account::{Account, AccountId};
use able_types::error::RepositoryError;

/// Read/write access to registered accounts.
///
/// The chat service only consumes `exists` and `get_by_id`; the rest backs
/// account registration and lookup in the CLI.
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait AccountDirectory: Send + Sync {
    /// Insert a new account. Fails with `Conflict` when the username is taken.
    fn create(
        &self,
        account: &Account,
    ) -> impl std::future::Future<Output = Result<Account, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &AccountId,
    ) -> impl std::future::Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    fn get_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Whether an account with this id is registered.
    fn exists(
        &self,
        id: &AccountId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// List accounts, newest first.
    fn list(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<Account>, RepositoryError>> + Send;

    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
