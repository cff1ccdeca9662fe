//! Records read from and written to the directory

use chrono::{DateTime, Utc};

/// An incubation program
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Program {
    pub id: String,
    pub name: String,
}

/// A social enterprise; belongs to exactly one program
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Enterprise {
    pub id: String,
    pub name: String,
    pub abbreviation: Option<String>,
    pub program_id: String,
}

impl Enterprise {
    /// Button label, with the abbreviation when the enterprise has one
    pub fn label(&self) -> String {
        match self.abbreviation.as_deref().map(str::trim) {
            Some(abbr) if !abbr.is_empty() => format!("{} ({})", self.name, abbr),
            _ => self.name.clone(),
        }
    }
}

/// A mentor; may serve several enterprises
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Mentor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Mentor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A completed registration linking a Telegram chat to an enterprise and mentor
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TelegramUser {
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub enterprise_id: String,
    pub enterprise_name: String,
    pub mentor_id: String,
    pub mentor_name: String,
    pub registered_at: DateTime<Utc>,
}
