//! PostgreSQL-backed directory

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::directory::Directory;
use crate::error::{DirectoryError, DirectoryResult};
use crate::model::{Enterprise, Mentor, Program, TelegramUser};

/// PostgreSQL unique constraint violation
const UNIQUE_VIOLATION: &str = "23505";

/// Column list for telegrambot queries.
const USER_COLUMNS: &str = "chatid AS chat_id, username, firstname AS first_name, \
    se_id AS enterprise_id, se_name AS enterprise_name, mentor_id, mentor_name, registered_at";

/// Column list for socialenterprises queries.
const ENTERPRISE_COLUMNS: &str = "se.se_id::text AS id, se.team_name AS name, \
    se.abbr AS abbreviation, se.program_id::text AS program_id";

/// Column list for mentors queries.
const MENTOR_COLUMNS: &str =
    "mentor_id::text AS id, mentor_firstname AS first_name, mentor_lastname AS last_name";

/// Directory backed by the dashboard's PostgreSQL database
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    /// Connect to the database at `url`
    ///
    /// # Arguments
    /// * `url` - PostgreSQL connection string
    /// * `max_connections` - Upper bound for the pool size
    pub async fn connect(url: &str, max_connections: u32) -> DirectoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to the database: {}", e);
                DirectoryError::from(e)
            })?;
        Ok(Self { pool })
    }

    /// Create the telegrambot table if it does not exist yet
    pub async fn migrate(&self) -> DirectoryResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("migration failed: {}", e)))
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn list_programs(&self) -> DirectoryResult<Vec<Program>> {
        let programs = sqlx::query_as::<_, Program>(
            "SELECT program_id::text AS id, name FROM programs ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(programs)
    }

    async fn find_program(&self, program_id: &str) -> DirectoryResult<Option<Program>> {
        let program = sqlx::query_as::<_, Program>(
            "SELECT program_id::text AS id, name FROM programs WHERE program_id::text = $1",
        )
        .bind(program_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(program)
    }

    async fn list_enterprises(&self, program_id: &str) -> DirectoryResult<Vec<Enterprise>> {
        let query = format!(
            "SELECT DISTINCT ON (se.se_id) {ENTERPRISE_COLUMNS}
             FROM socialenterprises se
             INNER JOIN mentorships m ON se.se_id = m.se_id
             WHERE se.program_id::text = $1"
        );
        let enterprises = sqlx::query_as::<_, Enterprise>(&query)
            .bind(program_id)
            .fetch_all(&self.pool)
            .await?;
        if enterprises.is_empty() {
            tracing::debug!("No enterprises with mentorships under program {}", program_id);
        }
        Ok(enterprises)
    }

    async fn find_enterprise(&self, enterprise_id: &str) -> DirectoryResult<Option<Enterprise>> {
        let query = format!(
            "SELECT {ENTERPRISE_COLUMNS} FROM socialenterprises se WHERE se.se_id::text = $1"
        );
        let enterprise = sqlx::query_as::<_, Enterprise>(&query)
            .bind(enterprise_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(enterprise)
    }

    async fn list_mentors(&self, enterprise_id: &str) -> DirectoryResult<Vec<Mentor>> {
        let query =
            format!("SELECT {MENTOR_COLUMNS} FROM mentors WHERE $1 = ANY(se_id::text[])");
        let mentors = sqlx::query_as::<_, Mentor>(&query)
            .bind(enterprise_id)
            .fetch_all(&self.pool)
            .await?;
        if mentors.is_empty() {
            tracing::debug!("No mentors assigned to enterprise {}", enterprise_id);
        }
        Ok(mentors)
    }

    async fn find_mentor(&self, mentor_id: &str) -> DirectoryResult<Option<Mentor>> {
        let query = format!("SELECT {MENTOR_COLUMNS} FROM mentors WHERE mentor_id::text = $1");
        let mentor = sqlx::query_as::<_, Mentor>(&query)
            .bind(mentor_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(mentor)
    }

    async fn find_user(&self, chat_id: i64) -> DirectoryResult<Option<TelegramUser>> {
        let query = format!("SELECT {USER_COLUMNS} FROM telegrambot WHERE chatid = $1");
        let user = sqlx::query_as::<_, TelegramUser>(&query)
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &TelegramUser) -> DirectoryResult<()> {
        let result = sqlx::query(
            "INSERT INTO telegrambot
                (chatid, username, firstname, se_id, se_name, mentor_id, mentor_name, registered_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.chat_id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.enterprise_id)
        .bind(&user.enterprise_name)
        .bind(&user.mentor_id)
        .bind(&user.mentor_name)
        .bind(user.registered_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::info!("Registered Telegram chat {}", user.chat_id);
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                tracing::warn!("Duplicate registration for chat {}", user.chat_id);
                Err(DirectoryError::Duplicate {
                    chat_id: user.chat_id,
                })
            }
            Err(err) => {
                tracing::error!("Error inserting Telegram user {}: {}", user.chat_id, err);
                Err(err.into())
            }
        }
    }
}
