use serde::{Deserialize, Serialize};

/// Forum thread identifier (stable for the thread's lifetime)
pub type ThreadId = u64;

/// Curated status of a thread in the mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingStatus {
    Approved,
    Pending,
    Ignored,
}

impl MappingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingStatus::Approved => "approved",
            MappingStatus::Pending => "pending",
            MappingStatus::Ignored => "ignored",
        }
    }

    /// Parse the persisted form; surrounding whitespace and case are ignored
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved" => Some(MappingStatus::Approved),
            "pending" => Some(MappingStatus::Pending),
            "ignored" => Some(MappingStatus::Ignored),
            _ => None,
        }
    }
}

/// One row of the mapping table
///
/// `task_url` is `Some` only when the cell is non-blank. An `Approved` row
/// must carry a URL; rows breaking that rule are kept as read but reported
/// by [`MappingRecord::inconsistency`] so callers can treat them as pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub thread_id: ThreadId,
    pub thread_title: String,
    pub task_url: Option<String>,
    pub status: MappingStatus,
    pub notes: String,
    /// Raw status text when it could not be parsed (row is loaded as pending)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub unparsed_status: Option<String>,
}

impl MappingRecord {
    pub fn new(thread_id: ThreadId, thread_title: impl Into<String>, status: MappingStatus) -> Self {
        Self {
            thread_id,
            thread_title: thread_title.into(),
            task_url: None,
            status,
            notes: String::new(),
            unparsed_status: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.task_url = if url.trim().is_empty() { None } else { Some(url.trim().to_string()) };
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Describe why this row cannot be trusted as-is, if it can't
    pub fn inconsistency(&self) -> Option<String> {
        if let Some(raw) = &self.unparsed_status {
            return Some(format!("unknown status '{}'", raw));
        }
        match (self.status, &self.task_url) {
            (MappingStatus::Approved, None) => Some("approved without a task url".to_string()),
            (MappingStatus::Pending, Some(url)) => Some(format!("pending with task url {}", url)),
            _ => None,
        }
    }

    /// Content key used to detect operator edits of this row
    ///
    /// Only the fields the resolver acts on participate; title and notes
    /// edits do not invalidate cached decisions.
    pub fn fingerprint(&self) -> String {
        let status = match &self.unparsed_status {
            Some(raw) => raw.as_str(),
            None => self.status.as_str(),
        };
        format!("{}|{}", status, self.task_url.as_deref().unwrap_or(""))
    }
}

/// Fingerprint recorded for threads that have no mapping row
pub const ABSENT_FINGERPRINT: &str = "absent";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_status_conversion() {
        assert_eq!(MappingStatus::Approved.as_str(), "approved");
        assert_eq!(MappingStatus::from_str("approved"), Some(MappingStatus::Approved));
        assert_eq!(MappingStatus::from_str(" Pending "), Some(MappingStatus::Pending));
        assert_eq!(MappingStatus::from_str("IGNORED"), Some(MappingStatus::Ignored));
        assert_eq!(MappingStatus::from_str("done"), None);
    }

    #[test]
    fn test_with_url_blank_is_none() {
        let record = MappingRecord::new(1, "t", MappingStatus::Pending).with_url("   ");
        assert_eq!(record.task_url, None);
    }

    #[test]
    fn test_inconsistency() {
        let ok = MappingRecord::new(1, "t", MappingStatus::Approved).with_url("https://notion.so/a");
        assert!(ok.inconsistency().is_none());

        let no_url = MappingRecord::new(1, "t", MappingStatus::Approved);
        assert!(no_url.inconsistency().unwrap().contains("without"));

        let pending_url = MappingRecord::new(1, "t", MappingStatus::Pending).with_url("https://notion.so/a");
        assert!(pending_url.inconsistency().is_some());

        let ignored = MappingRecord::new(1, "t", MappingStatus::Ignored);
        assert!(ignored.inconsistency().is_none());
    }

    #[test]
    fn test_fingerprint_ignores_title_and_notes() {
        let a = MappingRecord::new(7, "one", MappingStatus::Approved).with_url("https://notion.so/a");
        let b = MappingRecord::new(7, "two", MappingStatus::Approved)
            .with_url("https://notion.so/a")
            .with_notes("edited");
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = MappingRecord::new(7, "one", MappingStatus::Pending).with_url("https://notion.so/a");
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
