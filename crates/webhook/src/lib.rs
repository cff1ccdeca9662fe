//! Webhook receiver for Telegram updates
//!
//! Accepts updates on `POST /webhook`, turns them into conversation input
//! and answers with an HTTP status Telegram understands.

mod server;
mod update;

pub use server::{WebhookServer, WebhookState, DEFAULT_RESPONSE_TIMEOUT_SECS, SECRET_TOKEN_HEADER};
pub use update::{UpdateError, WebhookUpdate};
