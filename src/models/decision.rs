use serde::{Deserialize, Serialize};
use crate::models::{MappingStatus, ThreadId};

/// Where a resolution decision came from
///
/// Variants are ordered weakest to strongest so `Ord` follows provenance rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    StarterMessage,
    ExternalSearch,
    MappingTable,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::MappingTable => "mapping_table",
            Source::ExternalSearch => "external_search",
            Source::StarterMessage => "starter_message",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mapping_table" => Some(Source::MappingTable),
            "external_search" => Some(Source::ExternalSearch),
            "starter_message" => Some(Source::StarterMessage),
            _ => None,
        }
    }
}

/// Outcome of resolving one thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub thread_id: ThreadId,
    pub status: MappingStatus,
    pub task_url: Option<String>,
    pub source: Option<Source>,
}

impl Decision {
    pub fn approved(thread_id: ThreadId, url: String, source: Source) -> Self {
        Self { thread_id, status: MappingStatus::Approved, task_url: Some(url), source: Some(source) }
    }

    pub fn ignored(thread_id: ThreadId) -> Self {
        Self { thread_id, status: MappingStatus::Ignored, task_url: None, source: Some(Source::MappingTable) }
    }

    pub fn pending(thread_id: ThreadId) -> Self {
        Self { thread_id, status: MappingStatus::Pending, task_url: None, source: None }
    }

    /// Approved or Ignored: no further lookup required
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, MappingStatus::Approved | MappingStatus::Ignored)
    }

    /// Whether the caller should run the quality gate for this thread
    pub fn needs_intake(&self) -> bool {
        self.status == MappingStatus::Pending
    }
}

/// Persisted outcome of a terminal decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub thread_id: ThreadId,
    pub resolved_task_url: Option<String>,
    pub source: Source,
    pub decided_at: i64,
    /// Mapping row content the decision was made against
    pub mapping_fingerprint: String,
}

impl ProcessedRecord {
    pub fn from_decision(decision: &Decision, mapping_fingerprint: &str) -> Option<Self> {
        let source = decision.source?;
        if !decision.is_terminal() {
            return None;
        }
        Some(Self {
            thread_id: decision.thread_id,
            resolved_task_url: decision.task_url.clone(),
            source,
            decided_at: chrono::Utc::now().timestamp(),
            mapping_fingerprint: mapping_fingerprint.to_string(),
        })
    }

    /// Rebuild the decision this record was written for
    pub fn to_decision(&self) -> Decision {
        match &self.resolved_task_url {
            Some(url) => Decision::approved(self.thread_id, url.clone(), self.source),
            None => Decision::ignored(self.thread_id),
        }
    }
}
