//! Test doubles shared by the conversation tests

use async_trait::async_trait;
use directory::{
    Directory, DirectoryResult, Enterprise, MemoryDirectory, Mentor, Program, TelegramUser,
};
use std::sync::Arc;
use std::time::Duration;

/// Directory whose inserts take a while, so concurrent finalizations overlap
pub struct SlowInserts {
    inner: Arc<MemoryDirectory>,
    delay: Duration,
}

impl SlowInserts {
    pub fn new(inner: Arc<MemoryDirectory>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl Directory for SlowInserts {
    async fn list_programs(&self) -> DirectoryResult<Vec<Program>> {
        self.inner.list_programs().await
    }
    async fn find_program(&self, program_id: &str) -> DirectoryResult<Option<Program>> {
        self.inner.find_program(program_id).await
    }
    async fn list_enterprises(&self, program_id: &str) -> DirectoryResult<Vec<Enterprise>> {
        self.inner.list_enterprises(program_id).await
    }
    async fn find_enterprise(&self, enterprise_id: &str) -> DirectoryResult<Option<Enterprise>> {
        self.inner.find_enterprise(enterprise_id).await
    }
    async fn list_mentors(&self, enterprise_id: &str) -> DirectoryResult<Vec<Mentor>> {
        self.inner.list_mentors(enterprise_id).await
    }
    async fn find_mentor(&self, mentor_id: &str) -> DirectoryResult<Option<Mentor>> {
        self.inner.find_mentor(mentor_id).await
    }
    async fn find_user(&self, chat_id: i64) -> DirectoryResult<Option<TelegramUser>> {
        self.inner.find_user(chat_id).await
    }
    async fn insert_user(&self, user: &TelegramUser) -> DirectoryResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.insert_user(user).await
    }
}
