//! The directory interface consumed by the registration conversation

use async_trait::async_trait;

use crate::error::DirectoryResult;
use crate::model::{Enterprise, Mentor, Program, TelegramUser};

/// Read-only program data plus Telegram user persistence
///
/// Listing methods return an empty vector when nothing matches; lookups by id
/// return `None` for unknown ids. Errors are reserved for backend failures.
#[async_trait]
pub trait Directory: Send + Sync {
    /// All programs
    async fn list_programs(&self) -> DirectoryResult<Vec<Program>>;

    async fn find_program(&self, program_id: &str) -> DirectoryResult<Option<Program>>;

    /// Enterprises of a program that have at least one mentorship
    async fn list_enterprises(&self, program_id: &str) -> DirectoryResult<Vec<Enterprise>>;

    async fn find_enterprise(&self, enterprise_id: &str) -> DirectoryResult<Option<Enterprise>>;

    /// Mentors whose assignment list contains the enterprise
    async fn list_mentors(&self, enterprise_id: &str) -> DirectoryResult<Vec<Mentor>>;

    async fn find_mentor(&self, mentor_id: &str) -> DirectoryResult<Option<Mentor>>;

    /// The registered user for a chat, if any
    async fn find_user(&self, chat_id: i64) -> DirectoryResult<Option<TelegramUser>>;

    /// Persist a registration
    ///
    /// Fails with [`DirectoryError::Duplicate`](crate::DirectoryError::Duplicate)
    /// when the chat is already registered.
    async fn insert_user(&self, user: &TelegramUser) -> DirectoryResult<()>;
}
