use std::collections::HashMap;
use std::path::Path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::lookup::links::{belongs_to_database, first_task_url, thread_id_from_url};
use crate::lookup::{ExternalTaskLookup, LookupError, ThreadDirectory};
use crate::models::{ForumThread, TaskLink, ThreadId};

/// Forum and task-store data exported by the collaborators
///
/// ```json
/// {
///   "threads": [{"thread_id": 1463668685993541696, "title": "Logo", "starter_text": "..."}],
///   "tasks": [{"url": "https://www.notion.so/...", "thread_id": 1463668685993541696}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumSnapshot {
    #[serde(default)]
    pub threads: Vec<ForumThread>,
    #[serde(default)]
    pub tasks: Vec<TaskLink>,
}

impl ForumSnapshot {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
    }
}

/// Lookup answered from a [`ForumSnapshot`]
pub struct SnapshotLookup {
    threads: Vec<ForumThread>,
    index: HashMap<ThreadId, usize>,
    tasks: Vec<TaskLink>,
    database_id: Option<String>,
}

impl SnapshotLookup {
    pub fn new(snapshot: ForumSnapshot) -> Self {
        let index = snapshot
            .threads
            .iter()
            .enumerate()
            .map(|(pos, thread)| (thread.thread_id, pos))
            .collect();
        Self {
            threads: snapshot.threads,
            index,
            tasks: snapshot.tasks,
            database_id: None,
        }
    }

    /// Only accept starter-message links that belong to this task database
    pub fn with_database_id(mut self, database_id: Option<String>) -> Self {
        self.database_id = database_id;
        self
    }

    pub fn thread(&self, thread_id: ThreadId) -> Option<&ForumThread> {
        self.index.get(&thread_id).map(|&pos| &self.threads[pos])
    }
}

impl ExternalTaskLookup for SnapshotLookup {
    fn search_by_thread(&self, thread_id: ThreadId) -> Result<Option<String>, LookupError> {
        let linked = self.tasks.iter().find(|task| {
            task.thread_id == Some(thread_id)
                || task.thread_url.as_deref().and_then(thread_id_from_url) == Some(thread_id)
        });
        Ok(linked.map(|task| task.url.clone()))
    }

    fn extract_from_starter_message(&self, thread_id: ThreadId) -> Result<Option<String>, LookupError> {
        let thread = self
            .thread(thread_id)
            .ok_or_else(|| LookupError::NotFound(format!("thread {}", thread_id)))?;
        let text = thread
            .starter_text
            .as_deref()
            .ok_or_else(|| LookupError::NotFound(format!("starter message for thread {}", thread_id)))?;

        let Some(url) = first_task_url(text) else {
            log::debug!("No Notion link in starter message of thread {}", thread_id);
            return Ok(None);
        };

        if let Some(database_id) = &self.database_id {
            if !belongs_to_database(&url, database_id) {
                log::info!("Link {} in thread {} is not from database {}", url, thread_id, database_id);
                return Ok(None);
            }
        }

        Ok(Some(url))
    }
}

impl ThreadDirectory for SnapshotLookup {
    fn list_threads(&self) -> Result<Vec<ForumThread>, LookupError> {
        Ok(self.threads.clone())
    }
}
