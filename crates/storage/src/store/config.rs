#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DB_FILE: &str = "nestset.db";
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_dir: PathBuf,
    pub db_file: String,
    /// How long a writer waits for another connection's transaction before failing.
    pub busy_timeout: Duration,
    /// Run the full tree self-check before committing every mutation.
    pub verify_invariants: bool,
}

impl StoreConfig {
    pub fn new(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            storage_dir: storage_dir.as_ref().to_path_buf(),
            db_file: DEFAULT_DB_FILE.to_string(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            verify_invariants: cfg!(debug_assertions),
        }
    }

    /// Defaults overlaid with `NESTSET_DB_FILE`, `NESTSET_BUSY_TIMEOUT_MS` and `NESTSET_VERIFY`.
    pub fn from_env(storage_dir: impl AsRef<Path>) -> Self {
        let mut config = Self::new(storage_dir);
        if let Some(db_file) = env_var("NESTSET_DB_FILE") {
            config.db_file = db_file;
        }
        if let Some(ms) = env_var("NESTSET_BUSY_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
            config.busy_timeout = Duration::from_millis(ms);
        }
        if let Some(verify) = env_var("NESTSET_VERIFY").and_then(|v| parse_bool(&v)) {
            config.verify_invariants = verify;
        }
        config
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join(&self.db_file)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
