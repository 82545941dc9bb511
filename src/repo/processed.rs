use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use crate::models::{ProcessedRecord, Source, ThreadId};

/// Processed-thread repository for database operations
pub struct ProcessedRepo;

impl ProcessedRepo {
    /// Get the record for a thread
    pub fn get(conn: &Connection, thread_id: ThreadId) -> rusqlite::Result<Option<ProcessedRecord>> {
        let mut stmt = conn.prepare(
            "SELECT thread_id, resolved_task_url, source, decided_at, mapping_fingerprint
             FROM processed_threads WHERE thread_id = ?1"
        )?;
        stmt.query_row([thread_id.to_string()], row_to_record).optional()
    }

    /// Insert or replace the record for a thread
    pub fn upsert(conn: &Connection, record: &ProcessedRecord) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO processed_threads (thread_id, resolved_task_url, source, decided_at, mapping_fingerprint)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(thread_id) DO UPDATE SET
                resolved_task_url = excluded.resolved_task_url,
                source = excluded.source,
                decided_at = excluded.decided_at,
                mapping_fingerprint = excluded.mapping_fingerprint",
            rusqlite::params![
                record.thread_id.to_string(),
                record.resolved_task_url,
                record.source.as_str(),
                record.decided_at,
                record.mapping_fingerprint,
            ],
        )?;
        Ok(())
    }

    /// Delete the record for a thread; returns whether one existed
    pub fn delete(conn: &Connection, thread_id: ThreadId) -> rusqlite::Result<bool> {
        let rows = conn.execute(
            "DELETE FROM processed_threads WHERE thread_id = ?1",
            [thread_id.to_string()],
        )?;
        Ok(rows > 0)
    }

    /// List all records, most recent decision first
    pub fn list(conn: &Connection) -> rusqlite::Result<Vec<ProcessedRecord>> {
        let mut stmt = conn.prepare(
            "SELECT thread_id, resolved_task_url, source, decided_at, mapping_fingerprint
             FROM processed_threads
             ORDER BY decided_at DESC, thread_id"
        )?;
        let records = stmt.query_map([], row_to_record)?;

        let mut result = Vec::new();
        for record in records {
            result.push(record?);
        }
        Ok(result)
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<ProcessedRecord> {
    let thread_id: String = row.get(0)?;
    let thread_id = thread_id.parse::<ThreadId>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let source: String = row.get(2)?;
    let source = Source::from_str(&source).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown source '{}'", source).into(),
        )
    })?;
    Ok(ProcessedRecord {
        thread_id,
        resolved_task_url: row.get(1)?,
        source,
        decided_at: row.get(3)?,
        mapping_fingerprint: row.get(4)?,
    })
}

/// What a write through [`ProcessedStateStore::record`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Written,
    /// Same decision already stored; nothing changed
    Unchanged,
    /// A stronger source is stored for the same mapping content
    KeptStronger,
}

/// Shared, thread-safe handle on the processed state
///
/// All access goes through one connection behind a mutex, which serializes
/// the read-compare-write in [`record`](Self::record) so two events for the
/// same thread can't lose an update.
pub struct ProcessedStateStore {
    conn: Mutex<Connection>,
}

impl ProcessedStateStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    /// Open (and migrate) the state database at `path`
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::DbConnection::open(path)?))
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::DbConnection::connect_in_memory()?))
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn get(&self, thread_id: ThreadId) -> rusqlite::Result<Option<ProcessedRecord>> {
        ProcessedRepo::get(&self.lock(), thread_id)
    }

    /// Store a terminal decision
    ///
    /// Provenance never weakens while the mapping row is unchanged: if the
    /// stored record was made against the same mapping content by a stronger
    /// source, it is kept.
    pub fn record(&self, record: &ProcessedRecord) -> rusqlite::Result<RecordOutcome> {
        let conn = self.lock();
        if let Some(existing) = ProcessedRepo::get(&conn, record.thread_id)? {
            if existing.mapping_fingerprint == record.mapping_fingerprint {
                if existing.source > record.source {
                    return Ok(RecordOutcome::KeptStronger);
                }
                if existing.source == record.source && existing.resolved_task_url == record.resolved_task_url {
                    return Ok(RecordOutcome::Unchanged);
                }
            }
        }
        ProcessedRepo::upsert(&conn, record)?;
        Ok(RecordOutcome::Written)
    }

    /// Drop a cached record; returns whether one existed
    pub fn invalidate(&self, thread_id: ThreadId) -> rusqlite::Result<bool> {
        ProcessedRepo::delete(&self.lock(), thread_id)
    }

    pub fn list(&self) -> rusqlite::Result<Vec<ProcessedRecord>> {
        ProcessedRepo::list(&self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(thread_id: ThreadId, url: Option<&str>, source: Source, fingerprint: &str) -> ProcessedRecord {
        ProcessedRecord {
            thread_id,
            resolved_task_url: url.map(str::to_string),
            source,
            decided_at: 1_700_000_000,
            mapping_fingerprint: fingerprint.to_string(),
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let store = ProcessedStateStore::in_memory().unwrap();
        let rec = record(1463668685993541696, Some("https://notion.so/a"), Source::ExternalSearch, "absent");

        assert_eq!(store.record(&rec).unwrap(), RecordOutcome::Written);
        assert_eq!(store.get(1463668685993541696).unwrap(), Some(rec));
        assert_eq!(store.get(2).unwrap(), None);
    }

    #[test]
    fn test_same_decision_is_unchanged() {
        let store = ProcessedStateStore::in_memory().unwrap();
        let rec = record(1, Some("https://notion.so/a"), Source::StarterMessage, "absent");
        store.record(&rec).unwrap();

        let mut again = rec.clone();
        again.decided_at += 60;
        assert_eq!(store.record(&again).unwrap(), RecordOutcome::Unchanged);
        assert_eq!(store.get(1).unwrap().unwrap().decided_at, rec.decided_at);
    }

    #[test]
    fn test_weaker_source_does_not_overwrite() {
        let store = ProcessedStateStore::in_memory().unwrap();
        let strong = record(1, Some("https://notion.so/a"), Source::MappingTable, "approved|https://notion.so/a");
        store.record(&strong).unwrap();

        let weak = record(1, Some("https://notion.so/b"), Source::StarterMessage, "approved|https://notion.so/a");
        assert_eq!(store.record(&weak).unwrap(), RecordOutcome::KeptStronger);
        assert_eq!(store.get(1).unwrap(), Some(strong));
    }

    #[test]
    fn test_changed_mapping_allows_overwrite() {
        let store = ProcessedStateStore::in_memory().unwrap();
        store.record(&record(1, Some("https://notion.so/a"), Source::MappingTable, "approved|https://notion.so/a")).unwrap();

        let after_edit = record(1, Some("https://notion.so/b"), Source::ExternalSearch, "pending|");
        assert_eq!(store.record(&after_edit).unwrap(), RecordOutcome::Written);
        assert_eq!(store.get(1).unwrap(), Some(after_edit));
    }

    #[test]
    fn test_invalidate_and_list() {
        let store = ProcessedStateStore::in_memory().unwrap();
        store.record(&record(1, None, Source::MappingTable, "ignored|")).unwrap();
        store.record(&record(2, Some("https://notion.so/b"), Source::ExternalSearch, "absent")).unwrap();

        assert_eq!(store.list().unwrap().len(), 2);
        assert!(store.invalidate(1).unwrap());
        assert!(!store.invalidate(1).unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
