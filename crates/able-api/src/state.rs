//! Application state wiring all services together.
//!
//! Services are generic over repository traits; AppState pins them to the
//! SQLite implementations from able-infra.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use able_core::chat::service::ChatService;
use able_core::service::account::AccountService;
use able_infra::config::{database_url, load_config, resolve_data_dir};
use able_infra::sqlite::account::SqliteAccountRepository;
use able_infra::sqlite::chat::SqliteChatRepository;
use able_infra::sqlite::pool::DatabasePool;
use able_types::config::AbleConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository, SqliteAccountRepository>;

pub type ConcreteAccountService = AccountService<SqliteAccountRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub account_service: Arc<ConcreteAccountService>,
    pub config: AbleConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;

        let db_url = database_url(&data_dir);
        let db_pool = DatabasePool::new(&db_url, &config.database)
            .await
            .with_context(|| format!("failed to open database at {db_url}"))?;

        let accounts = SqliteAccountRepository::new(db_pool.clone());
        let chat_service = ChatService::new(
            SqliteChatRepository::new(db_pool.clone()),
            accounts.clone(),
            config.chat.clone(),
        );
        let account_service = AccountService::new(accounts);

        tracing::debug!(data_dir = %data_dir.display(), "Application state initialized");

        Ok(Self {
            chat_service: Arc::new(chat_service),
            account_service: Arc::new(account_service),
            config,
            data_dir,
            db_pool,
        })
    }
}
