//! Seam between the resolver and the forum / task-store collaborators.
//!
//! The crate never talks to either platform itself. Collaborators implement
//! [`ExternalTaskLookup`] (and [`ThreadDirectory`] for bulk scans) and hand
//! the resolver their answers as plain data. Every call may fail; the
//! resolver turns failures into "no result" through [`Strategy::attempt`].

pub mod bounded;
pub mod links;
pub mod snapshot;

pub use bounded::BoundedLookup;
pub use snapshot::{ForumSnapshot, SnapshotLookup};

use std::time::Duration;
use thiserror::Error;
use crate::models::{ForumThread, Source, ThreadId};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("lookup service unavailable: {0}")]
    Unavailable(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("malformed lookup response: {0}")]
    Malformed(String),
}

/// Task-store and forum queries the resolver relies on
pub trait ExternalTaskLookup: Send + Sync {
    /// Search the task store for a task linked to the thread
    fn search_by_thread(&self, thread_id: ThreadId) -> Result<Option<String>, LookupError>;

    /// Extract a task link from the thread's opening message
    fn extract_from_starter_message(&self, thread_id: ThreadId) -> Result<Option<String>, LookupError>;
}

/// Enumeration of every thread in the intake forum
pub trait ThreadDirectory: Send + Sync {
    fn list_threads(&self) -> Result<Vec<ForumThread>, LookupError>;
}

/// Stand-in when no collaborator data is available; every query answers "no result"
pub struct Offline;

impl ExternalTaskLookup for Offline {
    fn search_by_thread(&self, thread_id: ThreadId) -> Result<Option<String>, LookupError> {
        log::debug!("No snapshot; skipping task-store search for thread {}", thread_id);
        Ok(None)
    }

    fn extract_from_starter_message(&self, thread_id: ThreadId) -> Result<Option<String>, LookupError> {
        log::debug!("No snapshot; skipping starter message of thread {}", thread_id);
        Ok(None)
    }
}

/// One step of the fallback chain after the mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ExternalSearch,
    StarterMessage,
}

impl Strategy {
    /// Fallbacks in the order they are tried
    pub const CHAIN: [Strategy; 2] = [Strategy::ExternalSearch, Strategy::StarterMessage];

    pub fn source(&self) -> Source {
        match self {
            Strategy::ExternalSearch => Source::ExternalSearch,
            Strategy::StarterMessage => Source::StarterMessage,
        }
    }

    /// Run this step; any failure becomes `None`
    pub fn attempt(&self, lookup: &dyn ExternalTaskLookup, thread_id: ThreadId) -> Option<String> {
        let result = match self {
            Strategy::ExternalSearch => lookup.search_by_thread(thread_id),
            Strategy::StarterMessage => lookup.extract_from_starter_message(thread_id),
        };
        match result {
            Ok(Some(url)) if !url.trim().is_empty() => Some(url.trim().to_string()),
            Ok(_) => None,
            Err(err) => {
                log::warn!("{} lookup for thread {} failed: {}", self.source().as_str(), thread_id, err);
                None
            }
        }
    }
}
