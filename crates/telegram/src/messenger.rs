//! Outbound messages to Telegram
//!
//! The conversation talks to chats through the [`Messenger`] trait. The
//! production implementation wraps a teloxide [`Bot`]; tests use
//! [`RecordingMessenger`].

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use teloxide::prelude::*;
use teloxide::types::InlineKeyboardMarkup;

use crate::error::TransportError;

/// A message to send to a chat
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl OutgoingMessage {
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(
        chat_id: ChatId,
        text: impl Into<String>,
        keyboard: InlineKeyboardMarkup,
    ) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Sends messages and callback acknowledgements
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, message: OutgoingMessage) -> Result<(), TransportError>;

    /// Acknowledge a callback query so the client stops its loading state
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), TransportError>;
}

/// Messenger backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, message: OutgoingMessage) -> Result<(), TransportError> {
        let request = self.bot.send_message(message.chat_id, message.text);
        match message.keyboard {
            Some(keyboard) => {
                request.reply_markup(keyboard).await?;
            }
            None => {
                request.await?;
            }
        }
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), TransportError> {
        let mut request = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await?;
        Ok(())
    }
}

/// Messenger that records everything instead of sending it
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<OutgoingMessage>>,
    answered: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`TransportError::Unavailable`]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Most recent message sent to a chat
    pub fn last_to(&self, chat_id: ChatId) -> Option<OutgoingMessage> {
        self.sent().into_iter().rev().find(|m| m.chat_id == chat_id)
    }

    /// Callback ids acknowledged so far
    pub fn answered(&self) -> Vec<String> {
        self.answered.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn check(&self) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(TransportError::Unavailable("recording messenger set to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, message: OutgoingMessage) -> Result<(), TransportError> {
        self.check()?;
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(message);
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, _text: Option<&str>) -> Result<(), TransportError> {
        self.check()?;
        self.answered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(callback_id.to_string());
        Ok(())
    }
}
