use crate::conversation::Conversation;
use crate::types::{CallbackEvent, Command, HandlerResult, InboundUpdate, Sender, TextMessage};
use std::sync::Arc;
use teloxide::{dispatching::UpdateHandler, prelude::*, types::User, utils::command::BotCommands};

/// Register bot commands in Telegram menu
pub async fn set_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

/// Point Telegram at `url` for update delivery
pub async fn register_webhook(
    bot: &Bot,
    url: url::Url,
    secret_token: Option<&str>,
) -> Result<(), teloxide::RequestError> {
    let mut request = bot.set_webhook(url.clone());
    if let Some(token) = secret_token {
        request = request.secret_token(token.to_string());
    }
    request.await?;
    tracing::info!("Webhook registered at {}", url);
    Ok(())
}

/// Update handler tree for long polling
pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let message_handler = Update::filter_message().endpoint(on_message);
    let callback_handler = Update::filter_callback_query().endpoint(on_callback_query);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}

fn sender_of(user: Option<&User>) -> Sender {
    match user {
        Some(user) => Sender {
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()),
        },
        None => Sender::default(),
    }
}

async fn on_message(msg: Message, conversation: Arc<Conversation>) -> HandlerResult {
    let text = match msg.text() {
        Some(text) => text.to_string(),
        None => return Ok(()),
    };

    conversation
        .handle(InboundUpdate::Text(TextMessage {
            chat_id: msg.chat.id,
            sender: sender_of(msg.from()),
            text,
        }))
        .await;
    Ok(())
}

async fn on_callback_query(q: CallbackQuery, conversation: Arc<Conversation>) -> HandlerResult {
    let (data, message) = match (q.data, q.message) {
        (Some(data), Some(message)) => (data, message),
        _ => {
            tracing::debug!("Dropping callback {} without data or message", q.id);
            return Ok(());
        }
    };

    conversation
        .handle(InboundUpdate::Callback(CallbackEvent {
            callback_id: q.id,
            chat_id: message.chat.id,
            sender: sender_of(Some(&q.from)),
            data,
        }))
        .await;
    Ok(())
}
