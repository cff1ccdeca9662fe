use directory::DirectoryError;

use crate::constants::{emoji, messages};
use crate::selection::SelectionKind;

/// Outbound delivery to Telegram failed
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Telegram API error
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),
    /// The messenger could not be reached at all
    #[error("messenger unavailable: {0}")]
    Unavailable(String),
}

/// Everything that can go wrong while walking a chat through registration
///
/// All variants are recoverable: they are reported to the sender in the chat
/// and never turn into a failed webhook response.
#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    /// A step was attempted before the step it depends on
    #[error("no pending selection for this chat")]
    NoPendingSelection,
    /// Finalization attempted before every selection was made
    #[error("selection incomplete: no {missing} chosen")]
    IncompleteSelection { missing: SelectionKind },
    /// A fetcher returned nothing to choose from
    #[error("no {0} options available")]
    NoOptionsAvailable(SelectionKind),
    /// The chat is registered already, or another finalization won the race
    #[error("chat is already registered")]
    DuplicateRegistration,
    /// Callback payload could not be parsed or names an unknown record
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    /// A directory lookup exceeded its time budget
    #[error("{0} lookup timed out")]
    LookupTimedOut(&'static str),
    /// Sending to the chat failed
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The directory backend failed
    #[error("directory error: {0}")]
    Directory(DirectoryError),
}

impl From<DirectoryError> for ConversationError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Duplicate { .. } => ConversationError::DuplicateRegistration,
            other => ConversationError::Directory(other),
        }
    }
}

/// Result type alias for conversation operations
pub type ConversationResult<T> = Result<T, ConversationError>;

/// Helper trait to convert results into user-friendly messages
pub trait UserMessage {
    fn user_message(&self) -> String;
}

impl UserMessage for ConversationError {
    fn user_message(&self) -> String {
        match self {
            ConversationError::NoPendingSelection => format!(
                "{} There is no registration in progress for this step. Send /start to begin again.",
                emoji::WARNING
            ),
            ConversationError::IncompleteSelection { missing } => {
                format!("{} Please choose a {} first.", emoji::WARNING, missing)
            }
            ConversationError::NoOptionsAvailable(kind) => format!(
                "{} No {} options are available at the moment. Please try again later.",
                emoji::WARNING,
                kind
            ),
            ConversationError::DuplicateRegistration => messages::ALREADY_REGISTERED.to_string(),
            ConversationError::InvalidSelection(_) => format!(
                "{} That option is no longer available. Please choose again.",
                emoji::ERROR
            ),
            ConversationError::LookupTimedOut(_) => format!(
                "{} That took too long. Please tap your choice again.",
                emoji::HOURGLASS
            ),
            ConversationError::Transport(e) => format!("{} Communication error: {}", emoji::ERROR, e),
            ConversationError::Directory(_) => format!(
                "{} Something went wrong on our side. Please try again later.",
                emoji::ERROR
            ),
        }
    }
}
