pub mod constants;
pub mod conversation;
pub mod dedup;
pub mod error;
pub mod gate;
pub mod keyboards;
pub mod messenger;
pub mod options;
pub mod registration;
pub mod selection;
pub mod store;
pub mod telegram;
#[cfg(test)]
mod testing;
pub mod types;

pub use conversation::Conversation;
pub use error::{ConversationError, ConversationResult, TransportError, UserMessage};
pub use messenger::{Messenger, OutgoingMessage, RecordingMessenger, TelegramMessenger};
pub use selection::{Selection, SelectionKind};
pub use store::{SelectionStore, Step};
pub use types::{CallbackEvent, Command, HandlerResult, InboundUpdate, Sender, TextMessage};
