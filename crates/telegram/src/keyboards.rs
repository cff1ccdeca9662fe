//! Inline keyboard builders for the registration steps
//!
//! Every option gets its own row; the button's callback data is the encoded
//! [`Selection`].

use directory::{Enterprise, Mentor, Program};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::constants::MAX_CALLBACK_DATA_LEN;
use crate::error::{ConversationError, ConversationResult};
use crate::selection::{Selection, SelectionKind};

/// Create a one-button-per-row keyboard
///
/// # Arguments
/// * `kind` - The step the buttons answer
/// * `options` - `(label, id)` pairs
///
/// Options whose callback data would exceed Telegram's limit are skipped.
/// A keyboard left without buttons is reported as `NoOptionsAvailable`.
pub fn selection_keyboard<I>(kind: SelectionKind, options: I) -> ConversationResult<InlineKeyboardMarkup>
where
    I: IntoIterator<Item = (String, String)>,
{
    let buttons: Vec<Vec<InlineKeyboardButton>> = options
        .into_iter()
        .filter_map(|(label, id)| {
            let data = Selection::new(kind, id).encode();
            if data.len() > MAX_CALLBACK_DATA_LEN {
                tracing::warn!("Skipping {} option with oversized callback data: {}", kind, data);
                return None;
            }
            Some(vec![InlineKeyboardButton::callback(label, data)])
        })
        .collect();

    if buttons.is_empty() {
        return Err(ConversationError::NoOptionsAvailable(kind));
    }
    Ok(InlineKeyboardMarkup::new(buttons))
}

pub fn programs_keyboard(programs: &[Program]) -> ConversationResult<InlineKeyboardMarkup> {
    selection_keyboard(
        SelectionKind::Program,
        programs.iter().map(|p| (p.name.clone(), p.id.clone())),
    )
}

pub fn enterprises_keyboard(enterprises: &[Enterprise]) -> ConversationResult<InlineKeyboardMarkup> {
    selection_keyboard(
        SelectionKind::Enterprise,
        enterprises.iter().map(|e| (e.label(), e.id.clone())),
    )
}

pub fn mentors_keyboard(mentors: &[Mentor]) -> ConversationResult<InlineKeyboardMarkup> {
    selection_keyboard(
        SelectionKind::Mentor,
        mentors.iter().map(|m| (m.full_name(), m.id.clone())),
    )
}
