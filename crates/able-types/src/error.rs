use thiserror::Error;

/// Errors returned by chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Unknown account, or an unknown or inactive conversation.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller is not a participant of the conversation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Equal account ids, empty or oversized content.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A concurrent create raced us and the winner could not be re-read.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors related to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("account not found")]
    NotFound,

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from repository operations (used by trait definitions in able-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<AccountError> for ChatError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::NotFound => ChatError::NotFound("account not found".to_string()),
            AccountError::UsernameTaken(name) => {
                ChatError::Conflict(format!("username '{name}' is already taken"))
            }
            AccountError::InvalidUsername(msg) => ChatError::InvalidArgument(msg),
            AccountError::Storage(msg) => ChatError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::Forbidden("not a participant".to_string());
        assert_eq!(err.to_string(), "forbidden: not a participant");
    }

    #[test]
    fn test_account_error_display() {
        let err = AccountError::UsernameTaken("amal".to_string());
        assert_eq!(err.to_string(), "username 'amal' is already taken");
    }

    #[test]
    fn test_account_error_into_chat_error() {
        let err: ChatError = AccountError::NotFound.into();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
