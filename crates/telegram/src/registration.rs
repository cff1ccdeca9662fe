//! Finalizer: turns a complete pending registration into a persisted user

use chrono::Utc;
use directory::{Directory, TelegramUser};
use std::time::Duration;
use teloxide::types::ChatId;

use crate::error::{ConversationError, ConversationResult};
use crate::options::bounded;
use crate::store::SelectionStore;
use crate::types::Sender;

/// Persist the chat's pending registration and clear it from the store
///
/// Persistence and removal form one unit: the entry is claimed first so a
/// concurrent or redelivered finalize cannot persist a second record, and is
/// released untouched when the insert fails so the sender can retry.
///
/// # Errors
/// * `NoPendingSelection` - nothing pending for the chat
/// * `IncompleteSelection` - enterprise or mentor not chosen
/// * `DuplicateRegistration` - another finalize holds the entry or already
///   persisted the chat
/// * `Directory` / `LookupTimedOut` - the insert failed; the entry is kept
pub async fn finalize(
    store: &SelectionStore,
    directory: &dyn Directory,
    chat_id: ChatId,
    sender: &Sender,
    timeout: Duration,
) -> ConversationResult<TelegramUser> {
    let selection = store.claim(chat_id)?;

    let user = TelegramUser {
        chat_id: chat_id.0,
        username: sender.username.clone(),
        first_name: sender.first_name.clone(),
        enterprise_id: selection.enterprise_id,
        enterprise_name: selection.enterprise_name,
        mentor_id: selection.mentor_id,
        mentor_name: selection.mentor_name,
        registered_at: Utc::now(),
    };

    match bounded(timeout, "registration", directory.insert_user(&user)).await {
        Ok(()) => {
            store.finalize(chat_id)?;
            tracing::info!(
                "Chat {} registered under {} with mentor {}",
                chat_id.0,
                user.enterprise_name,
                user.mentor_name
            );
            Ok(user)
        }
        Err(ConversationError::DuplicateRegistration) => {
            // The chat is persisted already; the pending entry has nothing left to do
            store.finalize(chat_id).ok();
            Err(ConversationError::DuplicateRegistration)
        }
        Err(err) => {
            tracing::error!("Failed to persist registration for chat {}: {}", chat_id.0, err);
            store.release(chat_id);
            Err(err)
        }
    }
}
