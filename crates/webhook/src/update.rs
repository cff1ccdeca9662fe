//! Telegram update schema as delivered to the webhook
//!
//! Only the fields the registration conversation reads are modelled; unknown
//! fields are ignored by serde.

use serde::Deserialize;
use telegram::{CallbackEvent, InboundUpdate, Sender, TextMessage};
use teloxide::types::ChatId;

/// Why an update body was refused
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UpdateError {
    #[error("update carries both a message and a callback query")]
    Ambiguous,
    #[error("update is neither a message nor a callback query")]
    Unrecognized,
    #[error("callback query has no {0}")]
    IncompleteCallback(&'static str),
}

#[derive(Debug, Deserialize)]
pub struct WebhookUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<WireMessage>,
    #[serde(default)]
    pub edited_message: Option<WireMessage>,
    #[serde(default)]
    pub callback_query: Option<WireCallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct WireMessage {
    pub chat: WireChat,
    #[serde(default)]
    pub from: Option<WireUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireChat {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireCallbackQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub from: Option<WireUser>,
    #[serde(default)]
    pub message: Option<WireMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

impl WireMessage {
    /// The author, falling back to the chat's own profile
    fn sender(&self) -> Sender {
        let from = self.from.as_ref();
        Sender {
            username: from
                .and_then(|u| u.username.clone())
                .or_else(|| self.chat.username.clone()),
            first_name: from
                .and_then(|u| u.first_name.clone())
                .or_else(|| self.chat.first_name.clone()),
        }
    }
}

impl WebhookUpdate {
    /// Convert into the conversation's input
    ///
    /// # Returns
    /// * `Ok(None)` - a message without text, nothing to do
    /// * `Err(_)` - the body is not an update this service accepts
    pub fn into_inbound(self) -> Result<Option<InboundUpdate>, UpdateError> {
        let message = self.message.or(self.edited_message);

        match (message, self.callback_query) {
            (Some(_), Some(_)) => Err(UpdateError::Ambiguous),
            (None, None) => Err(UpdateError::Unrecognized),
            (Some(message), None) => {
                let sender = message.sender();
                Ok(message.text.map(|text| {
                    InboundUpdate::Text(TextMessage {
                        chat_id: ChatId(message.chat.id),
                        sender,
                        text,
                    })
                }))
            }
            (None, Some(query)) => {
                let callback_id = query.id.ok_or(UpdateError::IncompleteCallback("id"))?;
                let data = query.data.ok_or(UpdateError::IncompleteCallback("data"))?;
                let message = query
                    .message
                    .ok_or(UpdateError::IncompleteCallback("message"))?;

                let sender = match &query.from {
                    Some(from) => Sender {
                        username: from.username.clone(),
                        first_name: from.first_name.clone(),
                    },
                    None => message.sender(),
                };

                Ok(Some(InboundUpdate::Callback(CallbackEvent {
                    callback_id,
                    chat_id: ChatId(message.chat.id),
                    sender,
                    data,
                })))
            }
        }
    }
}
