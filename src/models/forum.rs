use serde::{Deserialize, Serialize};
use crate::models::ThreadId;

/// A forum thread as delivered by the event source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumThread {
    pub thread_id: ThreadId,
    pub title: String,
    /// Opening message text; `None` when the starter message is gone
    #[serde(default)]
    pub starter_text: Option<String>,
}

/// A task-store record as delivered by the task-store collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLink {
    pub url: String,
    /// Thread the task was created from, when recorded as an id
    #[serde(default)]
    pub thread_id: Option<ThreadId>,
    /// Thread the task was created from, when recorded as a forum link
    #[serde(default)]
    pub thread_url: Option<String>,
}
