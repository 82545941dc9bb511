use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use thiserror::Error;
use crate::models::{MappingRecord, MappingStatus, ThreadId};
use crate::utils::table::{self, TableError};

/// Column order of the persisted mapping table
pub const MAPPING_COLUMNS: [&str; 5] = ["thread_id", "thread_title", "notion_url", "status", "notes"];

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("mapping table {path} is unreadable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("mapping table has no header row")]
    MissingHeader,
    #[error("mapping table header is missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("mapping table is not valid CSV: {0}")]
    Csv(#[from] TableError),
}

/// In-memory mapping table keyed by thread id
///
/// This is the only place the CSV layout is read or written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    records: BTreeMap<ThreadId, MappingRecord>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, thread_id: ThreadId) -> Option<&MappingRecord> {
        self.records.get(&thread_id)
    }

    /// Insert or replace a row, returning the previous one
    pub fn insert(&mut self, record: MappingRecord) -> Option<MappingRecord> {
        self.records.insert(record.thread_id, record)
    }

    pub fn remove(&mut self, thread_id: ThreadId) -> Option<MappingRecord> {
        self.records.remove(&thread_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows in thread id order
    pub fn records(&self) -> impl Iterator<Item = &MappingRecord> {
        self.records.values()
    }

    pub fn count_status(&self, status: MappingStatus) -> usize {
        self.records.values().filter(|r| r.status == status && r.unparsed_status.is_none()).count()
    }

    /// Parse the CSV layout
    ///
    /// The header row is required; columns are located by name so operators
    /// may reorder them. Rows with an unparsable thread id are skipped with a
    /// warning. Rows with an unknown status load as pending and keep the raw
    /// text for auditing.
    pub fn from_csv(input: &str) -> Result<Self, MappingError> {
        let mut rows = table::parse_rows(input)?.into_iter();
        let header = rows.next().ok_or(MappingError::MissingHeader)?;
        let header: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();

        let mut positions = [0usize; 5];
        for (slot, column) in positions.iter_mut().zip(MAPPING_COLUMNS) {
            *slot = header
                .iter()
                .position(|h| h == column)
                .ok_or(MappingError::MissingColumn(column))?;
        }
        let [id_col, title_col, url_col, status_col, notes_col] = positions;

        let mut table = Self::new();
        for (index, row) in rows.enumerate() {
            let line = index + 2;
            let cell = |col: usize| row.get(col).map(String::as_str).unwrap_or("");

            let raw_id = cell(id_col).trim();
            let thread_id = match raw_id.parse::<ThreadId>() {
                Ok(id) => id,
                Err(_) => {
                    log::warn!("Skipping mapping row {}: invalid thread_id '{}'", line, raw_id);
                    continue;
                }
            };

            let raw_status = cell(status_col);
            let (status, unparsed_status) = match MappingStatus::from_str(raw_status) {
                Some(status) => (status, None),
                None => {
                    log::warn!("Mapping row {} (thread {}) has unknown status '{}'", line, thread_id, raw_status);
                    (MappingStatus::Pending, Some(raw_status.trim().to_string()))
                }
            };

            let mut record = MappingRecord::new(thread_id, cell(title_col), status)
                .with_url(cell(url_col))
                .with_notes(cell(notes_col));
            record.unparsed_status = unparsed_status;

            if table.insert(record).is_some() {
                log::warn!("Mapping row {} repeats thread {}; later row wins", line, thread_id);
            }
        }

        Ok(table)
    }

    /// Render the CSV layout, header first, rows in thread id order
    pub fn to_csv(&self) -> String {
        let mut out = table::encode_row(&MAPPING_COLUMNS);
        for record in self.records.values() {
            let status = record.unparsed_status.as_deref().unwrap_or(record.status.as_str());
            out.push_str(&table::encode_row(&[
                record.thread_id.to_string().as_str(),
                record.thread_title.as_str(),
                record.task_url.as_deref().unwrap_or(""),
                status,
                record.notes.as_str(),
            ]));
        }
        out
    }

    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let content = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv(&content)
    }

    /// Write atomically: a sibling temp file is renamed over the target
    pub fn save(&self, path: &Path) -> Result<(), MappingError> {
        let io_err = |source| MappingError::Io { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        let mut file = std::fs::File::create(&tmp_path).map_err(io_err)?;
        file.write_all(self.to_csv().as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        std::fs::rename(&tmp_path, path).map_err(io_err)?;
        Ok(())
    }
}

impl FromIterator<MappingRecord> for MappingTable {
    fn from_iter<I: IntoIterator<Item = MappingRecord>>(iter: I) -> Self {
        let mut table = Self::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

// File identity used to notice operator edits
type FileStamp = (SystemTime, u64);

struct Loaded {
    table: Arc<MappingTable>,
    stamp: Option<FileStamp>,
}

/// Shared access to the mapping table
///
/// A file-backed store re-reads the CSV whenever its modification stamp
/// changes, so manual edits take effect without a restart. Readers share a
/// read lock; [`replace_all`](Self::replace_all) and [`update`](Self::update)
/// hold the write lock across the file write, so no reader observes a
/// half-rewritten table.
pub struct MappingStore {
    path: Option<PathBuf>,
    state: RwLock<Loaded>,
}

impl MappingStore {
    /// File-backed store; nothing is read until first access
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            state: RwLock::new(Loaded { table: Arc::new(MappingTable::new()), stamp: None }),
        }
    }

    /// Store without a backing file (tests and embedding)
    pub fn in_memory(table: MappingTable) -> Self {
        Self {
            path: None,
            state: RwLock::new(Loaded { table: Arc::new(table), stamp: None }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn file_stamp(path: &Path) -> Result<FileStamp, MappingError> {
        let meta = std::fs::metadata(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let modified = meta.modified().map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok((modified, meta.len()))
    }

    /// Current table, reloaded from disk if the file changed
    pub fn snapshot(&self) -> Result<Arc<MappingTable>, MappingError> {
        let Some(path) = &self.path else {
            return Ok(self.read_state().table.clone());
        };

        let stamp = Self::file_stamp(path)?;
        {
            let state = self.read_state();
            if state.stamp == Some(stamp) {
                return Ok(state.table.clone());
            }
        }

        let mut state = self.write_state();
        // Another caller may have reloaded while we waited for the lock
        let stamp = Self::file_stamp(path)?;
        if state.stamp != Some(stamp) {
            log::debug!("Loading mapping table from {}", path.display());
            state.table = Arc::new(MappingTable::load(path)?);
            state.stamp = Some(stamp);
        }
        Ok(state.table.clone())
    }

    /// Row for one thread
    pub fn get(&self, thread_id: ThreadId) -> Result<Option<MappingRecord>, MappingError> {
        Ok(self.snapshot()?.get(thread_id).cloned())
    }

    /// Replace the whole table in one exclusive write
    pub fn replace_all(&self, table: MappingTable) -> Result<(), MappingError> {
        let mut state = self.write_state();
        if let Some(path) = &self.path {
            table.save(path)?;
            state.stamp = Some(Self::file_stamp(path)?);
        }
        state.table = Arc::new(table);
        Ok(())
    }

    /// Apply an operator edit to the current table and persist it
    ///
    /// A missing file starts from an empty table.
    pub fn update<F, T>(&self, edit: F) -> Result<T, MappingError>
    where
        F: FnOnce(&mut MappingTable) -> T,
    {
        let mut state = self.write_state();
        let mut table = match &self.path {
            Some(path) if path.exists() => MappingTable::load(path)?,
            Some(_) => MappingTable::new(),
            None => (*state.table).clone(),
        };
        let result = edit(&mut table);
        if let Some(path) = &self.path {
            table.save(path)?;
            state.stamp = Some(Self::file_stamp(path)?);
        }
        state.table = Arc::new(table);
        Ok(result)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, Loaded> {
        self.state.read().unwrap_or_else(|err| err.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, Loaded> {
        self.state.write().unwrap_or_else(|err| err.into_inner())
    }
}
