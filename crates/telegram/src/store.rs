//! Selection state store for registrations in progress
//!
//! Each chat walking through registration owns one [`PendingRegistration`].
//! Entries idle for longer than the store's TTL are treated as absent and
//! removed by [`SelectionStore::purge_expired`].

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use teloxide::types::ChatId;

use crate::constants::DEFAULT_SELECTION_TTL_MINUTES;
use crate::error::{ConversationError, ConversationResult};
use crate::selection::SelectionKind;

/// The registration step a chat is currently answering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    AwaitingProgram,
    AwaitingEnterprise,
    AwaitingMentor,
    Complete,
}

/// A registration that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRegistration {
    pub program_id: Option<String>,
    pub enterprise_id: Option<String>,
    pub enterprise_name: Option<String>,
    pub mentor_id: Option<String>,
    pub mentor_name: Option<String>,
    pub step: Step,
    /// Last time this entry was created or changed
    pub updated_at: DateTime<Utc>,
    claimed: bool,
}

impl PendingRegistration {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            program_id: None,
            enterprise_id: None,
            enterprise_name: None,
            mentor_id: None,
            mentor_name: None,
            step: Step::AwaitingProgram,
            updated_at: now,
            claimed: false,
        }
    }

    /// Whether a finalization currently holds this entry
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    fn completed(&self) -> ConversationResult<CompletedSelection> {
        let (enterprise_id, enterprise_name) = match (&self.enterprise_id, &self.enterprise_name) {
            (Some(id), Some(name)) => (id.clone(), name.clone()),
            _ => {
                return Err(ConversationError::IncompleteSelection {
                    missing: SelectionKind::Enterprise,
                })
            }
        };
        let (mentor_id, mentor_name) = match (&self.mentor_id, &self.mentor_name) {
            (Some(id), Some(name)) => (id.clone(), name.clone()),
            _ => {
                return Err(ConversationError::IncompleteSelection {
                    missing: SelectionKind::Mentor,
                })
            }
        };

        Ok(CompletedSelection {
            program_id: self.program_id.clone(),
            enterprise_id,
            enterprise_name,
            mentor_id,
            mentor_name,
        })
    }

    fn ensure_unclaimed(&self) -> ConversationResult<()> {
        if self.claimed {
            Err(ConversationError::DuplicateRegistration)
        } else {
            Ok(())
        }
    }
}

/// A pending registration with every required selection made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSelection {
    pub program_id: Option<String>,
    pub enterprise_id: String,
    pub enterprise_name: String,
    pub mentor_id: String,
    pub mentor_name: String,
}

/// Store holding all pending registrations, keyed by chat
#[derive(Clone)]
pub struct SelectionStore {
    entries: Arc<RwLock<HashMap<ChatId, PendingRegistration>>>,
    ttl: Duration,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_SELECTION_TTL_MINUTES))
    }
}

impl SelectionStore {
    /// Create an empty store
    ///
    /// # Arguments
    /// * `ttl` - Idle time after which an entry expires
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Record that the chat passed the secret check
    ///
    /// Creates an entry awaiting a program unless a live one exists, in which
    /// case only its timestamp is refreshed.
    pub fn authorize(&self, chat_id: ChatId) {
        let now = Utc::now();
        let mut entries = self.write();
        match self.live_entry(&mut entries, chat_id, now) {
            Some(entry) => entry.updated_at = now,
            None => {
                entries.insert(chat_id, PendingRegistration::new(now));
            }
        }
    }

    /// Select a program, creating the entry when absent
    ///
    /// Choosing a different program clears the enterprise and mentor chosen
    /// under the previous one.
    pub fn begin_or_update(&self, chat_id: ChatId, program_id: &str) -> ConversationResult<()> {
        let now = Utc::now();
        let mut entries = self.write();
        if self.live_entry(&mut entries, chat_id, now).is_none() {
            entries.insert(chat_id, PendingRegistration::new(now));
        }
        let entry = entries
            .get_mut(&chat_id)
            .ok_or(ConversationError::NoPendingSelection)?;
        entry.ensure_unclaimed()?;

        if entry.program_id.as_deref() != Some(program_id) {
            entry.program_id = Some(program_id.to_string());
            entry.enterprise_id = None;
            entry.enterprise_name = None;
            entry.mentor_id = None;
            entry.mentor_name = None;
            entry.step = Step::AwaitingEnterprise;
        } else if entry.step == Step::AwaitingProgram {
            entry.step = Step::AwaitingEnterprise;
        }
        entry.updated_at = now;
        Ok(())
    }

    /// Select a social enterprise
    ///
    /// # Errors
    /// `NoPendingSelection` when the chat has no live entry.
    pub fn set_enterprise(
        &self,
        chat_id: ChatId,
        enterprise_id: &str,
        enterprise_name: &str,
    ) -> ConversationResult<()> {
        let now = Utc::now();
        let mut entries = self.write();
        let entry = self
            .live_entry(&mut entries, chat_id, now)
            .ok_or(ConversationError::NoPendingSelection)?;
        entry.ensure_unclaimed()?;

        if entry.enterprise_id.as_deref() != Some(enterprise_id) {
            entry.mentor_id = None;
            entry.mentor_name = None;
        }
        entry.enterprise_id = Some(enterprise_id.to_string());
        entry.enterprise_name = Some(enterprise_name.to_string());
        entry.step = Step::AwaitingMentor;
        entry.updated_at = now;
        Ok(())
    }

    /// Select a mentor
    ///
    /// # Errors
    /// `NoPendingSelection` when the chat has no live entry or has not chosen
    /// an enterprise yet.
    pub fn set_mentor(
        &self,
        chat_id: ChatId,
        mentor_id: &str,
        mentor_name: &str,
    ) -> ConversationResult<()> {
        let now = Utc::now();
        let mut entries = self.write();
        let entry = self
            .live_entry(&mut entries, chat_id, now)
            .ok_or(ConversationError::NoPendingSelection)?;
        entry.ensure_unclaimed()?;

        if entry.enterprise_id.is_none() {
            return Err(ConversationError::NoPendingSelection);
        }
        entry.mentor_id = Some(mentor_id.to_string());
        entry.mentor_name = Some(mentor_name.to_string());
        entry.step = Step::Complete;
        entry.updated_at = now;
        Ok(())
    }

    /// Mark a complete entry as being finalized
    ///
    /// While claimed, the entry cannot be claimed again, mutated, discarded or
    /// expire. Follow with [`finalize`](Self::finalize) on success or
    /// [`release`](Self::release) on failure.
    pub fn claim(&self, chat_id: ChatId) -> ConversationResult<CompletedSelection> {
        let now = Utc::now();
        let mut entries = self.write();
        let entry = self
            .live_entry(&mut entries, chat_id, now)
            .ok_or(ConversationError::NoPendingSelection)?;
        entry.ensure_unclaimed()?;

        let completed = entry.completed()?;
        entry.claimed = true;
        Ok(completed)
    }

    /// Give a claimed entry back, unchanged, for a later retry
    pub fn release(&self, chat_id: ChatId) {
        let mut entries = self.write();
        if let Some(entry) = entries.get_mut(&chat_id) {
            entry.claimed = false;
            entry.updated_at = Utc::now();
        }
    }

    /// Remove and return a complete entry
    ///
    /// # Errors
    /// `NoPendingSelection` when the chat has no live entry,
    /// `IncompleteSelection` when the enterprise or mentor is unset (the entry
    /// is left in place).
    pub fn finalize(&self, chat_id: ChatId) -> ConversationResult<CompletedSelection> {
        let now = Utc::now();
        let mut entries = self.write();
        let entry = self
            .live_entry(&mut entries, chat_id, now)
            .ok_or(ConversationError::NoPendingSelection)?;

        let completed = entry.completed()?;
        entries.remove(&chat_id);
        Ok(completed)
    }

    /// Drop an unclaimed entry
    ///
    /// Returns `true` if an entry was removed.
    pub fn discard(&self, chat_id: ChatId) -> bool {
        let mut entries = self.write();
        match entries.get(&chat_id) {
            Some(entry) if !entry.claimed => entries.remove(&chat_id).is_some(),
            _ => false,
        }
    }

    /// Get a copy of the live entry for a chat
    pub fn get(&self, chat_id: ChatId) -> Option<PendingRegistration> {
        let now = Utc::now();
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&chat_id)
            .filter(|entry| self.is_live(entry, now))
            .cloned()
    }

    /// Current step of the chat's live entry
    pub fn step(&self, chat_id: ChatId) -> Option<Step> {
        self.get(chat_id).map(|entry| entry.step)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Utc::now();
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|entry| self.is_live(entry, now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove expired entries
    ///
    /// # Returns
    /// * Number of entries removed
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    /// Remove entries that are expired as of `now`
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.write();
        let initial_count = entries.len();
        entries.retain(|_, entry| self.is_live(entry, now));
        initial_count - entries.len()
    }

    fn is_live(&self, entry: &PendingRegistration, now: DateTime<Utc>) -> bool {
        entry.claimed || now.signed_duration_since(entry.updated_at) < self.ttl
    }

    /// Live entry for the chat; an expired one is removed on the way
    fn live_entry<'a>(
        &self,
        entries: &'a mut HashMap<ChatId, PendingRegistration>,
        chat_id: ChatId,
        now: DateTime<Utc>,
    ) -> Option<&'a mut PendingRegistration> {
        let expired = entries
            .get(&chat_id)
            .is_some_and(|entry| !self.is_live(entry, now));
        if expired {
            tracing::debug!("Pending registration for chat {} expired", chat_id.0);
            entries.remove(&chat_id);
        }
        entries.get_mut(&chat_id)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ChatId, PendingRegistration>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
