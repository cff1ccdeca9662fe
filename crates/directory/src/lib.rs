//! Program directory for the LSEED Insight bot
//!
//! This crate provides read access to the incubation program data the
//! registration conversation needs (programs, social enterprises, mentors)
//! and persistence for registered Telegram users. The PostgreSQL backend
//! talks to the dashboard's database; the in-memory backend backs tests.

pub mod directory;
pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;

pub use directory::Directory;
pub use error::{DirectoryError, DirectoryResult};
pub use memory::MemoryDirectory;
pub use model::{Enterprise, Mentor, Program, TelegramUser};
pub use postgres::PgDirectory;
