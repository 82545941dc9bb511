use serde::Serialize;
use crate::lookup::{ExternalTaskLookup, LookupError, ThreadDirectory};
use crate::models::{MappingRecord, MappingStatus};
use crate::repo::{MappingError, MappingStore, MappingTable};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PopulateError {
    #[error("failed to enumerate forum threads: {0}")]
    Directory(#[from] LookupError),
    #[error("failed to write mapping table: {0}")]
    Mapping(#[from] MappingError),
}

/// Note written on rows whose starter message carries no task link
pub const NO_LINK_NOTE: &str = "No Notion link in starter message";

/// Counts reported after a rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    pub approved_count: usize,
    pub pending_count: usize,
    pub total: usize,
}

/// Rebuilds the mapping table from a full scan of the forum
///
/// The rebuild replaces the whole table: manual edits made since the last
/// rebuild are lost. Threads whose starter message carries no task link, or
/// whose starter message cannot be read, are written as pending with a note.
pub struct MappingPopulator<'a> {
    directory: &'a dyn ThreadDirectory,
    lookup: &'a dyn ExternalTaskLookup,
}

impl<'a> MappingPopulator<'a> {
    pub fn new(directory: &'a dyn ThreadDirectory, lookup: &'a dyn ExternalTaskLookup) -> Self {
        Self { directory, lookup }
    }

    /// Scan every thread and build the replacement table
    pub fn scan(&self) -> Result<MappingTable, PopulateError> {
        let threads = self.directory.list_threads()?;
        let total = threads.len();
        let mut table = MappingTable::new();

        for (index, thread) in threads.into_iter().enumerate() {
            log::debug!("[{}/{}] Scanning thread {} ({})", index + 1, total, thread.thread_id, thread.title);

            let found = self
                .lookup
                .extract_from_starter_message(thread.thread_id)
                .map(|url| url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()));
            let record = match found {
                Ok(Some(url)) => MappingRecord::new(thread.thread_id, thread.title, MappingStatus::Approved).with_url(url),
                Ok(None) => MappingRecord::new(thread.thread_id, thread.title, MappingStatus::Pending)
                    .with_notes(NO_LINK_NOTE),
                Err(err) => {
                    log::warn!("Could not read starter message of thread {}: {}", thread.thread_id, err);
                    MappingRecord::new(thread.thread_id, thread.title, MappingStatus::Pending)
                        .with_notes(format!("Error: {}", err))
                }
            };
            table.insert(record);
        }

        Ok(table)
    }

    /// Scan and replace the store's contents in one exclusive write
    pub fn rebuild(&self, store: &MappingStore) -> Result<RebuildSummary, PopulateError> {
        let table = self.scan()?;
        let summary = RebuildSummary {
            approved_count: table.count_status(MappingStatus::Approved),
            pending_count: table.count_status(MappingStatus::Pending),
            total: table.len(),
        };
        store.replace_all(table)?;
        log::info!(
            "Mapping table rebuilt: {} approved, {} pending, {} total",
            summary.approved_count,
            summary.pending_count,
            summary.total
        );
        Ok(summary)
    }
}
