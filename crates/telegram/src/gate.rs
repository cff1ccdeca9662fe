//! Registration gate
//!
//! Decides what a chat may do based on where it stands:
//!
//! | state          | input             | action              |
//! |----------------|-------------------|---------------------|
//! | Unregistered   | /start            | PromptSecret        |
//! | Unregistered   | secret            | OfferPrograms       |
//! | Unregistered   | other text        | RejectSecret        |
//! | Unregistered   | /cancel           | NothingToCancel     |
//! | Unregistered   | selection         | RequireSecret       |
//! | Selecting(_)   | /start or secret  | OfferPrograms       |
//! | Selecting(_)   | other text        | RemindSelection     |
//! | Selecting(_)   | /cancel           | CancelSelection     |
//! | Selecting(_)   | selection         | Proceed             |
//! | Registered     | /start            | AlreadyRegistered   |
//! | Registered     | anything else     | Ignore              |
//!
//! `/help` answers with the command list unless the chat is registered.
//! Offering programs moves an unregistered chat to `Selecting` only when at
//! least one program exists.

use crate::selection::Selection;
use crate::store::Step;

/// Where a chat stands in registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unregistered,
    Selecting(Step),
    Registered,
}

/// What the chat sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateInput {
    Start,
    Help,
    Cancel,
    Text(String),
    Select(Selection),
}

impl GateInput {
    /// Classify a text message
    ///
    /// Commands may carry a bot mention (`/start@lseed_bot`) and trailing
    /// arguments; anything else is plain text and kept verbatim.
    pub fn from_text(text: &str) -> Self {
        let command = text
            .trim()
            .strip_prefix('/')
            .and_then(|rest| rest.split_whitespace().next())
            .map(|word| word.split('@').next().unwrap_or(word).to_lowercase());

        match command.as_deref() {
            Some("start") => GateInput::Start,
            Some("help") => GateInput::Help,
            Some("cancel") => GateInput::Cancel,
            _ => GateInput::Text(text.to_string()),
        }
    }
}

/// What the conversation should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    PromptSecret,
    RejectSecret,
    OfferPrograms,
    AlreadyRegistered,
    ShowHelp,
    CancelSelection,
    NothingToCancel,
    RemindSelection,
    RequireSecret,
    Proceed(Selection),
    Ignore,
}

/// Transition function of the gate
pub fn transition(state: GateState, input: &GateInput, secret: &str) -> GateAction {
    match (state, input) {
        (GateState::Registered, GateInput::Start) => GateAction::AlreadyRegistered,
        (GateState::Registered, _) => GateAction::Ignore,

        (_, GateInput::Help) => GateAction::ShowHelp,

        (GateState::Unregistered, GateInput::Start) => GateAction::PromptSecret,
        (GateState::Unregistered, GateInput::Text(text)) if text == secret => {
            GateAction::OfferPrograms
        }
        (GateState::Unregistered, GateInput::Text(_)) => GateAction::RejectSecret,
        (GateState::Unregistered, GateInput::Cancel) => GateAction::NothingToCancel,
        (GateState::Unregistered, GateInput::Select(_)) => GateAction::RequireSecret,

        (GateState::Selecting(_), GateInput::Start) => GateAction::OfferPrograms,
        (GateState::Selecting(_), GateInput::Text(text)) if text == secret => {
            GateAction::OfferPrograms
        }
        (GateState::Selecting(_), GateInput::Text(_)) => GateAction::RemindSelection,
        (GateState::Selecting(_), GateInput::Cancel) => GateAction::CancelSelection,
        (GateState::Selecting(_), GateInput::Select(selection)) => {
            GateAction::Proceed(selection.clone())
        }
    }
}
