//! Thread → task reconciliation.
//!
//! Sources are consulted in priority order and the first answer wins:
//!
//! 1. the mapping table (curated by operators, always authoritative),
//! 2. a task-store search for a task linked to the thread,
//! 3. a task link in the thread's opening message.
//!
//! A thread none of them can place is pending. Terminal decisions are kept in
//! the processed state so repeat events need not query the collaborators
//! again; a cached decision is only reused while the thread's mapping row is
//! unchanged.

use std::sync::Arc;
use thiserror::Error;
use crate::lookup::{ExternalTaskLookup, Strategy};
use crate::models::{Decision, MappingRecord, MappingStatus, ProcessedRecord, Source, ThreadId, ABSENT_FINGERPRINT};
use crate::repo::{MappingError, MappingStore, ProcessedStateStore, RecordOutcome};

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The mapping table could not be read; no decision is safe
    #[error("mapping table unavailable: {0}")]
    TrustedSourceUnavailable(#[from] MappingError),
    #[error("processed state store failed: {0}")]
    StateStore(#[from] rusqlite::Error),
}

pub struct ThreadResolver {
    mapping: Arc<MappingStore>,
    processed: Arc<ProcessedStateStore>,
    lookup: Arc<dyn ExternalTaskLookup>,
    reuse_cached: bool,
}

impl ThreadResolver {
    pub fn new(
        mapping: Arc<MappingStore>,
        processed: Arc<ProcessedStateStore>,
        lookup: Arc<dyn ExternalTaskLookup>,
    ) -> Self {
        Self { mapping, processed, lookup, reuse_cached: true }
    }

    /// Always query the collaborators instead of reusing cached decisions
    pub fn without_cache(mut self) -> Self {
        self.reuse_cached = false;
        self
    }

    /// Decide whether a task exists for `thread_id`
    ///
    /// Lookup failures only downgrade the answer towards pending. A mapping
    /// table that cannot be read is returned as
    /// [`ResolveError::TrustedSourceUnavailable`].
    pub fn resolve(&self, thread_id: ThreadId) -> Result<Decision, ResolveError> {
        let row = self.mapping.get(thread_id)?;
        let fingerprint = row
            .as_ref()
            .map(MappingRecord::fingerprint)
            .unwrap_or_else(|| ABSENT_FINGERPRINT.to_string());

        if let Some(decision) = row.as_ref().and_then(trusted_decision) {
            log::info!("Thread {} is {} per mapping table", thread_id, decision.status.as_str());
            self.remember(&decision, &fingerprint)?;
            return Ok(decision);
        }

        if let Some(cached) = self.processed.get(thread_id)? {
            if cached.mapping_fingerprint == fingerprint && cached.source != Source::MappingTable {
                if self.reuse_cached {
                    log::debug!("Thread {} answered from processed state ({})", thread_id, cached.source.as_str());
                    return Ok(cached.to_decision());
                }
            } else {
                log::debug!("Mapping row for thread {} changed; dropping cached decision", thread_id);
                self.processed.invalidate(thread_id)?;
            }
        }

        for strategy in Strategy::CHAIN {
            log::debug!("Thread {}: trying {}", thread_id, strategy.source().as_str());
            if let Some(url) = strategy.attempt(self.lookup.as_ref(), thread_id) {
                let decision = Decision::approved(thread_id, url, strategy.source());
                log::info!("Thread {} linked to {} via {}", thread_id, decision.task_url.as_deref().unwrap_or(""), strategy.source().as_str());
                self.remember(&decision, &fingerprint)?;
                return Ok(decision);
            }
        }

        log::info!("Thread {} has no linked task; pending intake", thread_id);
        Ok(Decision::pending(thread_id))
    }

    fn remember(&self, decision: &Decision, fingerprint: &str) -> Result<(), ResolveError> {
        if let Some(record) = ProcessedRecord::from_decision(decision, fingerprint) {
            if self.processed.record(&record)? == RecordOutcome::KeptStronger {
                log::debug!("Kept stronger stored decision for thread {}", decision.thread_id);
            }
        }
        Ok(())
    }
}

/// Decision the mapping row settles on its own, if any
///
/// Pending rows and rows in an inconsistent state defer to the fallbacks.
fn trusted_decision(row: &MappingRecord) -> Option<Decision> {
    if let Some(reason) = row.inconsistency() {
        log::warn!("Mapping row for thread {} is inconsistent ({}); treating as pending", row.thread_id, reason);
        return None;
    }
    match row.status {
        MappingStatus::Approved => row
            .task_url
            .clone()
            .map(|url| Decision::approved(row.thread_id, url, Source::MappingTable)),
        MappingStatus::Ignored => Some(Decision::ignored(row.thread_id)),
        MappingStatus::Pending => None,
    }
}
