use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Maximum username length accepted by the account directory.
pub const MAX_USERNAME_LEN: usize = 150;

/// Unique identifier for an account, wrapping a UUID v7 (time-sortable).
///
/// Ordering follows the UUID byte order, which is also the lexical order of
/// the lowercase hyphenated string form stored in SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Create a new AccountId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create an AccountId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// What kind of member an account represents on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Person with a disability.
    Pwd,
    Client,
    /// Doctor or therapist.
    Doctor,
    Trainer,
    Admin,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKind::Pwd => write!(f, "pwd"),
            AccountKind::Client => write!(f, "client"),
            AccountKind::Doctor => write!(f, "doctor"),
            AccountKind::Trainer => write!(f, "trainer"),
            AccountKind::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pwd" => Ok(AccountKind::Pwd),
            "client" => Ok(AccountKind::Client),
            "doctor" => Ok(AccountKind::Doctor),
            "trainer" => Ok(AccountKind::Trainer),
            "admin" => Ok(AccountKind::Admin),
            other => Err(format!("invalid account kind: '{other}'")),
        }
    }
}

impl Default for AccountKind {
    fn default() -> Self {
        AccountKind::Pwd
    }
}

/// A registered member of the platform.
///
/// The chat subsystem only needs the id for references; the remaining
/// fields are carried for display in conversation lists and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Unique login name.
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub kind: AccountKind,
    /// Single uppercase character shown in place of a profile picture.
    pub avatar: String,
    /// Staff accounts may run administrative chat actions.
    pub is_staff: bool,
    pub is_verified: bool,
    pub joined_at: DateTime<Utc>,
}

impl Account {
    /// Name to show in listings: full name when known, else the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Request to register a new account. Only `username` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<String>,
    pub kind: Option<AccountKind>,
    #[serde(default)]
    pub is_staff: bool,
}

/// Derive the avatar character from the first name, falling back to the username.
///
/// # Examples
///
/// ```
/// use able_types::account::derive_avatar;
///
/// assert_eq!(derive_avatar("amira", "ali"), "A");
/// assert_eq!(derive_avatar("", "zed"), "Z");
/// assert_eq!(derive_avatar("", ""), "");
/// ```
pub fn derive_avatar(first_name: &str, username: &str) -> String {
    let source = if first_name.trim().is_empty() {
        username.trim()
    } else {
        first_name.trim()
    };

    source
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

/// Validate and normalize a username.
///
/// Usernames are trimmed, must be non-empty, at most [`MAX_USERNAME_LEN`]
/// characters, and may contain only letters, digits and `@ . + - _`.
pub fn normalize_username(raw: &str) -> Result<String, String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err("username cannot be empty".to_string());
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        ));
    }
    if let Some(bad) = username
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')))
    {
        return Err(format!("username contains invalid character '{bad}'"));
    }
    Ok(username.to_string())
}
