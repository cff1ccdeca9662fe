//! Constants used throughout the telegram bot

/// Telegram rejects callback data longer than this many bytes
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

/// Idle time after which a pending registration is dropped
pub const DEFAULT_SELECTION_TTL_MINUTES: i64 = 30;

/// Upper bound for a single directory lookup
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 5;

/// Callback ids seen within this window are treated as redeliveries
pub const CALLBACK_REDELIVERY_WINDOW_SECS: u64 = 60;

/// How often the background sweeper purges expired state
pub const SWEEP_INTERVAL_SECS: u64 = 60;

/// Emoji constants for consistent UI
pub mod emoji {
    pub const SUCCESS: &str = "✅";
    pub const ERROR: &str = "❌";
    pub const WARNING: &str = "⚠️";
    pub const HOURGLASS: &str = "⌛";
}

/// Fixed replies sent by the registration conversation
pub mod messages {
    pub const PROMPT_SECRET: &str =
        "🔑 Please enter the password to register and continue interacting with the bot.";
    pub const INCORRECT_SECRET: &str = "❌ Incorrect password. Please try again.";
    pub const ALREADY_REGISTERED: &str =
        "✅ You are already registered! No need to enter the password again.";
    pub const NO_PROGRAMS: &str = "⚠️ No programs available at the moment. Please try again later.";
    pub const CHOOSE_PROGRAM: &str = "✅ Password correct!\n\nPlease choose your program:";
    pub const CHOICE_RECEIVED: &str = "✅ Choice received!";
    pub const REMIND_SELECTION: &str =
        "👆 Please pick one of the options above, or send /cancel to start over.";
    pub const CANCELLED: &str = "Registration cancelled. Send /start whenever you want to try again.";
    pub const NOTHING_TO_CANCEL: &str = "There is no registration in progress.";
    pub const SECRET_REQUIRED: &str =
        "🔑 Please send /start and enter the password before choosing an option.";
}
