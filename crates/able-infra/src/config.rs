//! Configuration loader and data directory resolution.
//!
//! Reads `config.toml` from the data directory (`~/.able/` in production)
//! and deserializes it into [`AbleConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use able_types::config::AbleConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ABLE_DATA_DIR";

/// Environment variable overriding the database URL.
pub const DATABASE_URL_ENV: &str = "ABLE_DATABASE_URL";

/// Resolve the data directory: `ABLE_DATA_DIR`, else `~/.able`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".able")
}

/// Database URL: `ABLE_DATABASE_URL`, else `{data_dir}/able.db`.
pub fn database_url(data_dir: &Path) -> String {
    std::env::var(DATABASE_URL_ENV)
        .unwrap_or_else(|_| format!("sqlite://{}/able.db?mode=rwc", data_dir.display()))
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`AbleConfig::default()`].
/// - Unreadable or invalid file: logs a warning and returns the default.
/// - Otherwise the parsed config, with values clamped to their floors.
pub async fn load_config(data_dir: &Path) -> AbleConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AbleConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AbleConfig::default();
        }
    };

    match toml::from_str::<AbleConfig>(&content) {
        Ok(config) => clamp(config),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AbleConfig::default()
        }
    }
}

fn clamp(mut config: AbleConfig) -> AbleConfig {
    config.database.max_readers = config.database.max_readers.max(1);
    config.database.busy_timeout_secs = config.database.busy_timeout_secs.max(1);
    config.chat.max_message_length = config.chat.max_message_length.max(1);
    config
}
