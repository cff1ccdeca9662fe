use teloxide::{macros::BotCommands, types::ChatId};

/// Type alias for handler result types
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Available bot commands
#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "Register this chat with LSEED Insight")]
    Start,
    #[command(description = "Display help information")]
    Help,
    #[command(description = "Cancel the registration in progress")]
    Cancel,
}

/// Who sent an update, as reported by the chat
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// A text message from a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub sender: Sender,
    pub text: String,
}

/// A tap on an inline keyboard button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    pub callback_id: String,
    pub chat_id: ChatId,
    pub sender: Sender,
    pub data: String,
}

/// One inbound update; never both a message and a callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundUpdate {
    Text(TextMessage),
    Callback(CallbackEvent),
}

impl InboundUpdate {
    pub fn chat_id(&self) -> ChatId {
        match self {
            InboundUpdate::Text(message) => message.chat_id,
            InboundUpdate::Callback(event) => event.chat_id,
        }
    }
}
