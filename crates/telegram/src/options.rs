//! Option fetchers
//!
//! Bounded, read-only lookups against the directory. Listing fetchers report
//! an empty result as [`ConversationError::NoOptionsAvailable`] so callers
//! never present an empty keyboard.

use directory::{Directory, DirectoryResult, Enterprise, Mentor, Program};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConversationError, ConversationResult};
use crate::selection::SelectionKind;

/// Run a directory call with a time budget
///
/// # Arguments
/// * `timeout` - Budget for the call
/// * `what` - Name of the lookup, reported on expiry
/// * `lookup` - The directory call
pub async fn bounded<T, F>(timeout: Duration, what: &'static str, lookup: F) -> ConversationResult<T>
where
    F: Future<Output = DirectoryResult<T>>,
{
    match tokio::time::timeout(timeout, lookup).await {
        Ok(result) => result.map_err(ConversationError::from),
        Err(_) => {
            tracing::warn!("{} lookup timed out after {:?}", what, timeout);
            Err(ConversationError::LookupTimedOut(what))
        }
    }
}

fn non_empty<T>(items: Vec<T>, kind: SelectionKind) -> ConversationResult<Vec<T>> {
    if items.is_empty() {
        Err(ConversationError::NoOptionsAvailable(kind))
    } else {
        Ok(items)
    }
}

/// Fetches the choices offered at each registration step
#[derive(Clone)]
pub struct OptionFetcher {
    directory: Arc<dyn Directory>,
    timeout: Duration,
}

impl OptionFetcher {
    pub fn new(directory: Arc<dyn Directory>, timeout: Duration) -> Self {
        Self { directory, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// All programs
    pub async fn programs(&self) -> ConversationResult<Vec<Program>> {
        let programs = bounded(self.timeout, "program", self.directory.list_programs()).await?;
        non_empty(programs, SelectionKind::Program)
    }

    /// Enterprises of a program that already have a mentorship
    pub async fn enterprises(&self, program_id: &str) -> ConversationResult<Vec<Enterprise>> {
        let enterprises = bounded(
            self.timeout,
            "social enterprise",
            self.directory.list_enterprises(program_id),
        )
        .await?;
        non_empty(enterprises, SelectionKind::Enterprise)
    }

    /// Mentors assigned to an enterprise
    pub async fn mentors(&self, enterprise_id: &str) -> ConversationResult<Vec<Mentor>> {
        let mentors =
            bounded(self.timeout, "mentor", self.directory.list_mentors(enterprise_id)).await?;
        non_empty(mentors, SelectionKind::Mentor)
    }

    /// Resolve a selected program id
    pub async fn program(&self, program_id: &str) -> ConversationResult<Program> {
        bounded(self.timeout, "program", self.directory.find_program(program_id))
            .await?
            .ok_or_else(|| ConversationError::InvalidSelection(format!("unknown program {}", program_id)))
    }

    /// Resolve a selected enterprise id within the chosen program
    pub async fn enterprise(&self, program_id: &str, enterprise_id: &str) -> ConversationResult<Enterprise> {
        let enterprise = bounded(
            self.timeout,
            "social enterprise",
            self.directory.find_enterprise(enterprise_id),
        )
        .await?
        .ok_or_else(|| {
            ConversationError::InvalidSelection(format!("unknown enterprise {}", enterprise_id))
        })?;

        if enterprise.program_id != program_id {
            return Err(ConversationError::InvalidSelection(format!(
                "enterprise {} is not part of program {}",
                enterprise_id, program_id
            )));
        }
        Ok(enterprise)
    }

    /// Resolve a selected mentor id among the enterprise's mentors
    pub async fn mentor(&self, enterprise_id: &str, mentor_id: &str) -> ConversationResult<Mentor> {
        let mentor = bounded(self.timeout, "mentor", self.directory.find_mentor(mentor_id))
            .await?
            .ok_or_else(|| ConversationError::InvalidSelection(format!("unknown mentor {}", mentor_id)))?;

        let assigned =
            bounded(self.timeout, "mentor", self.directory.list_mentors(enterprise_id)).await?;
        if !assigned.iter().any(|m| m.id == mentor.id) {
            return Err(ConversationError::InvalidSelection(format!(
                "mentor {} is not assigned to enterprise {}",
                mentor_id, enterprise_id
            )));
        }
        Ok(mentor)
    }
}
