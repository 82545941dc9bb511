// Runtime configuration read from ~/.threadlink/rc
//
// The rc file holds `key=value` lines. Blank lines and lines starting with
// `#` are ignored. Relative paths resolve against the rc file's directory.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_DIR: &str = ".threadlink";
const RC_FILE: &str = "rc";
const DEFAULT_STATE_FILE: &str = "state.db";
const DEFAULT_MAPPING_FILE: &str = "thread_mapping.csv";
const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_CONTEXT_MIN_WORDS: usize = 12;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid value for {key} on line {line}: '{value}'")]
    InvalidValue { key: String, value: String, line: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite database holding processed-thread state
    pub state_path: PathBuf,
    /// CSV mapping table curated by operators
    pub mapping_path: PathBuf,
    /// Upper bound for each external lookup call
    pub lookup_timeout: Duration,
    /// When set, starter-message links must belong to this task database
    pub notion_database_id: Option<String>,
    /// Minimum word count before the context heuristic considers a text
    pub context_min_words: usize,
}

impl Config {
    /// Defaults rooted at `base_dir`
    pub fn with_base(base_dir: &Path) -> Self {
        Self {
            state_path: base_dir.join(DEFAULT_STATE_FILE),
            mapping_path: base_dir.join(DEFAULT_MAPPING_FILE),
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            notion_database_id: None,
            context_min_words: DEFAULT_CONTEXT_MIN_WORDS,
        }
    }

    /// Directory holding the rc file and default data files
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_DIR))
            .ok_or(ConfigError::NoHomeDir)
    }

    pub fn rc_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(RC_FILE))
    }

    /// Load configuration from the rc file, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        let rc_path = Self::rc_path()?;
        let base_dir = rc_path.parent().map(Path::to_path_buf).unwrap_or_default();

        if !rc_path.exists() {
            log::debug!("No rc file at {}, using defaults", rc_path.display());
            return Ok(Self::with_base(&base_dir));
        }

        let content = std::fs::read_to_string(&rc_path).map_err(|source| ConfigError::Read {
            path: rc_path.clone(),
            source,
        })?;
        Self::parse(&content, &base_dir)
    }

    /// Parse rc file content
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::with_base(base_dir);

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("Ignoring rc line {} without '=': {}", index + 1, line);
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            let invalid = || ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                line: index + 1,
            };

            match key {
                "data.location" => config.state_path = resolve_path(base_dir, value),
                "mapping.location" => config.mapping_path = resolve_path(base_dir, value),
                "lookup.timeout_ms" => {
                    let ms: u64 = value.parse().map_err(|_| invalid())?;
                    if ms == 0 {
                        return Err(invalid());
                    }
                    config.lookup_timeout = Duration::from_millis(ms);
                }
                "notion.database_id" => {
                    config.notion_database_id = if value.is_empty() {
                        None
                    } else {
                        Some(value.replace('-', "").to_lowercase())
                    };
                }
                "gate.context.min_words" => {
                    config.context_min_words = value.parse().map_err(|_| invalid())?;
                }
                other => log::warn!("Ignoring unknown rc key '{}'", other),
            }
        }

        Ok(config)
    }
}

fn resolve_path(base_dir: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path
    }
}
