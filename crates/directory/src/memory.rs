//! In-memory directory
//!
//! Holds programs, enterprises, mentors and registrations in process memory.
//! Used by the test suites of the bot and webhook crates in place of the
//! database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::directory::Directory;
use crate::error::{DirectoryError, DirectoryResult};
use crate::model::{Enterprise, Mentor, Program, TelegramUser};

#[derive(Default)]
struct Tables {
    programs: Vec<Program>,
    enterprises: Vec<Enterprise>,
    /// Mentor plus the enterprise ids in its assignment list
    mentors: Vec<(Mentor, Vec<String>)>,
    /// (enterprise id, mentor id) pairs
    mentorships: Vec<(String, String)>,
    users: HashMap<i64, TelegramUser>,
}

/// Directory kept entirely in memory
#[derive(Default)]
pub struct MemoryDirectory {
    tables: RwLock<Tables>,
    fail_inserts: AtomicBool,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, id: &str, name: &str) -> Self {
        self.tables_mut().programs.push(Program {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_enterprise(
        mut self,
        id: &str,
        name: &str,
        abbreviation: Option<&str>,
        program_id: &str,
    ) -> Self {
        self.tables_mut().enterprises.push(Enterprise {
            id: id.to_string(),
            name: name.to_string(),
            abbreviation: abbreviation.map(str::to_string),
            program_id: program_id.to_string(),
        });
        self
    }

    /// Add a mentor assigned to the given enterprises
    pub fn with_mentor(
        mut self,
        id: &str,
        first_name: &str,
        last_name: &str,
        enterprise_ids: &[&str],
    ) -> Self {
        let mentor = Mentor {
            id: id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        let assignments = enterprise_ids.iter().map(|e| e.to_string()).collect();
        self.tables_mut().mentors.push((mentor, assignments));
        self
    }

    pub fn with_mentorship(mut self, enterprise_id: &str, mentor_id: &str) -> Self {
        self.tables_mut()
            .mentorships
            .push((enterprise_id.to_string(), mentor_id.to_string()));
        self
    }

    pub fn with_user(mut self, user: TelegramUser) -> Self {
        self.tables_mut().users.insert(user.chat_id, user);
        self
    }

    /// Make every subsequent insert fail with [`DirectoryError::Unavailable`]
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of persisted registrations
    pub fn user_count(&self) -> usize {
        self.read().users.len()
    }

    fn tables_mut(&mut self) -> &mut Tables {
        self.tables.get_mut().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn list_programs(&self) -> DirectoryResult<Vec<Program>> {
        Ok(self.read().programs.clone())
    }

    async fn find_program(&self, program_id: &str) -> DirectoryResult<Option<Program>> {
        Ok(self.read().programs.iter().find(|p| p.id == program_id).cloned())
    }

    async fn list_enterprises(&self, program_id: &str) -> DirectoryResult<Vec<Enterprise>> {
        let tables = self.read();
        let enterprises = tables
            .enterprises
            .iter()
            .filter(|e| e.program_id == program_id)
            .filter(|e| tables.mentorships.iter().any(|(se, _)| *se == e.id))
            .cloned()
            .collect();
        Ok(enterprises)
    }

    async fn find_enterprise(&self, enterprise_id: &str) -> DirectoryResult<Option<Enterprise>> {
        Ok(self
            .read()
            .enterprises
            .iter()
            .find(|e| e.id == enterprise_id)
            .cloned())
    }

    async fn list_mentors(&self, enterprise_id: &str) -> DirectoryResult<Vec<Mentor>> {
        let mentors = self
            .read()
            .mentors
            .iter()
            .filter(|(_, assignments)| assignments.iter().any(|e| e == enterprise_id))
            .map(|(mentor, _)| mentor.clone())
            .collect();
        Ok(mentors)
    }

    async fn find_mentor(&self, mentor_id: &str) -> DirectoryResult<Option<Mentor>> {
        Ok(self
            .read()
            .mentors
            .iter()
            .find(|(m, _)| m.id == mentor_id)
            .map(|(m, _)| m.clone()))
    }

    async fn find_user(&self, chat_id: i64) -> DirectoryResult<Option<TelegramUser>> {
        Ok(self.read().users.get(&chat_id).cloned())
    }

    async fn insert_user(&self, user: &TelegramUser) -> DirectoryResult<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("inserts disabled".to_string()));
        }

        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        if tables.users.contains_key(&user.chat_id) {
            return Err(DirectoryError::Duplicate {
                chat_id: user.chat_id,
            });
        }
        tables.users.insert(user.chat_id, user.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> MemoryDirectory {
        MemoryDirectory::new()
            .with_program("p1", "Program A")
            .with_program("p2", "Program B")
            .with_enterprise("e1", "Green Roots", Some("GR"), "p1")
            .with_enterprise("e2", "Blue Waters", None, "p1")
            .with_enterprise("e3", "Red Earth", None, "p2")
            .with_mentor("m1", "Ana", "Reyes", &["e1"])
            .with_mentor("m2", "Ben", "Cruz", &["e1", "e2"])
            .with_mentorship("e1", "m1")
    }

    fn user(chat_id: i64) -> TelegramUser {
        TelegramUser {
            chat_id,
            username: Some("ana".to_string()),
            first_name: Some("Ana".to_string()),
            enterprise_id: "e1".to_string(),
            enterprise_name: "Green Roots".to_string(),
            mentor_id: "m1".to_string(),
            mentor_name: "Ana Reyes".to_string(),
            registered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_enterprises_require_mentorship() {
        let directory = sample();

        let enterprises = directory.list_enterprises("p1").await.unwrap();
        assert_eq!(enterprises.len(), 1);
        assert_eq!(enterprises[0].id, "e1");

        // e3 belongs to p2 but has no mentorship
        assert!(directory.list_enterprises("p2").await.unwrap().is_empty());
        assert!(directory.list_enterprises("unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mentors_by_assignment() {
        let directory = sample();

        let mentors = directory.list_mentors("e1").await.unwrap();
        assert_eq!(mentors.len(), 2);

        let mentors = directory.list_mentors("e2").await.unwrap();
        assert_eq!(mentors.len(), 1);
        assert_eq!(mentors[0].id, "m2");

        assert!(directory.list_mentors("e3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let directory = sample();
        assert_eq!(directory.find_program("p2").await.unwrap().unwrap().name, "Program B");
        assert_eq!(directory.find_enterprise("e2").await.unwrap().unwrap().name, "Blue Waters");
        assert_eq!(directory.find_mentor("m2").await.unwrap().unwrap().full_name(), "Ben Cruz");
        assert!(directory.find_program("nope").await.unwrap().is_none());
        assert!(directory.find_mentor("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate() {
        let directory = sample();

        directory.insert_user(&user(111)).await.unwrap();
        assert_eq!(directory.user_count(), 1);

        let err = directory.insert_user(&user(111)).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Duplicate { chat_id: 111 }));
        assert_eq!(directory.user_count(), 1);

        assert!(directory.find_user(111).await.unwrap().is_some());
        assert!(directory.find_user(222).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failing_inserts() {
        let directory = sample();
        directory.set_fail_inserts(true);
        assert!(matches!(
            directory.insert_user(&user(1)).await,
            Err(DirectoryError::Unavailable(_))
        ));
        assert_eq!(directory.user_count(), 0);

        directory.set_fail_inserts(false);
        assert!(directory.insert_user(&user(1)).await.is_ok());
    }
}
