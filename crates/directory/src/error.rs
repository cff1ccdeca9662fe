//! Errors raised by directory backends

/// Failure while reading from or writing to the directory
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// A Telegram user record already exists for this chat
    #[error("chat {chat_id} is already registered")]
    Duplicate { chat_id: i64 },

    /// The database rejected or failed the query
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backend cannot serve requests right now
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for directory operations
pub type DirectoryResult<T> = Result<T, DirectoryError>;
