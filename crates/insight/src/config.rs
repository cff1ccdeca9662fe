use std::time::Duration;
use telegram::constants::{DEFAULT_LOOKUP_TIMEOUT_SECS, DEFAULT_SELECTION_TTL_MINUTES};
use webhook::DEFAULT_RESPONSE_TIMEOUT_SECS;

/// Configuration problems detected at startup
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// How updates reach the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotMode {
    Webhook,
    Polling,
}

/// Service settings loaded from environment variables
///
/// | Env Var                  | Default    |
/// |--------------------------|------------|
/// | `TELEGRAM_BOT_TOKEN`     | required (falls back to `TELOXIDE_TOKEN`) |
/// | `DATABASE_URL`           | required   |
/// | `REGISTRATION_PASSWORD`  | required   |
/// | `BOT_MODE`               | `webhook`  |
/// | `WEBHOOK_HOST`           | `0.0.0.0`  |
/// | `WEBHOOK_PORT`           | `4000`     |
/// | `PUBLIC_URL`             | unset      |
/// | `WEBHOOK_SECRET_TOKEN`   | unset      |
/// | `SELECTION_TTL_MINUTES`  | `30`       |
/// | `LOOKUP_TIMEOUT_SECS`    | `5`        |
/// | `DB_MAX_CONNECTIONS`     | `5`        |
/// | `WEBHOOK_RESPONSE_TIMEOUT_SECS` | `2` |
/// | `LOG_FORMAT`             | text (`json` for JSON lines) |
#[derive(Debug, Clone)]
pub struct Settings {
    pub bot_token: String,
    pub database_url: String,
    pub registration_password: String,
    pub mode: BotMode,
    pub host: String,
    pub port: u16,
    /// Public base URL; `<url>/webhook` is registered with Telegram when set
    pub public_url: Option<url::Url>,
    pub webhook_secret_token: Option<String>,
    pub selection_ttl: chrono::Duration,
    pub lookup_timeout: Duration,
    pub db_max_connections: u32,
    pub response_timeout: Duration,
    pub json_logs: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup`, which returns a variable's value if set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("TELOXIDE_TOKEN"))
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let database_url = require("DATABASE_URL")?;
        // The password is compared verbatim, so it is not trimmed
        let registration_password = require("REGISTRATION_PASSWORD")?;

        let mode = match get("BOT_MODE").map(|m| m.trim().to_lowercase()).as_deref() {
            None | Some("webhook") => BotMode::Webhook,
            Some("polling") => BotMode::Polling,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "BOT_MODE",
                    value: other.to_string(),
                    reason: "expected `webhook` or `polling`".to_string(),
                })
            }
        };

        let host = get("WEBHOOK_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse(&get, "WEBHOOK_PORT", 4000)?;

        let public_url = match get("PUBLIC_URL") {
            Some(raw) => Some(url::Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
                name: "PUBLIC_URL",
                value: raw.clone(),
                reason: e.to_string(),
            })?),
            None => None,
        };

        let ttl_minutes: i64 = positive(
            "SELECTION_TTL_MINUTES",
            parse(&get, "SELECTION_TTL_MINUTES", DEFAULT_SELECTION_TTL_MINUTES)?,
        )?;
        let lookup_secs: u64 = positive(
            "LOOKUP_TIMEOUT_SECS",
            parse(&get, "LOOKUP_TIMEOUT_SECS", DEFAULT_LOOKUP_TIMEOUT_SECS)?,
        )?;
        let db_max_connections: u32 =
            positive("DB_MAX_CONNECTIONS", parse(&get, "DB_MAX_CONNECTIONS", 5)?)?;
        let response_secs: u64 = positive(
            "WEBHOOK_RESPONSE_TIMEOUT_SECS",
            parse(&get, "WEBHOOK_RESPONSE_TIMEOUT_SECS", DEFAULT_RESPONSE_TIMEOUT_SECS)?,
        )?;

        let json_logs = get("LOG_FORMAT")
            .map(|f| f.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            bot_token,
            database_url,
            registration_password,
            mode,
            host,
            port,
            public_url,
            webhook_secret_token: get("WEBHOOK_SECRET_TOKEN"),
            selection_ttl: chrono::Duration::minutes(ttl_minutes),
            lookup_timeout: Duration::from_secs(lookup_secs),
            db_max_connections,
            response_timeout: Duration::from_secs(response_secs),
            json_logs,
        })
    }

    /// URL Telegram should deliver updates to
    pub fn webhook_url(&self) -> Option<url::Url> {
        self.public_url.as_ref().and_then(|base| {
            let base = base.as_str().trim_end_matches('/');
            url::Url::parse(&format!("{}/webhook", base)).ok()
        })
    }
}

fn positive<T>(name: &'static str, value: T) -> Result<T, ConfigError>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "must be positive".to_string(),
        })
    }
}

fn parse<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
