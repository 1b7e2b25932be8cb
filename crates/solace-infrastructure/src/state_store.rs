//! TOML-backed implementation of the durable local store.
//!
//! The whole state fits in one small table, so the store keeps an in-memory
//! copy and rewrites the file on every mutation. Writes go through a
//! temporary file plus atomic rename, guarded by an advisory file lock, so a
//! crash mid-write never leaves a torn state file behind.

use crate::paths::SolacePaths;
use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use solace_core::error::{Result, SolaceError};
use solace_core::storage::{LocalStore, StateKey};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// On-disk schema of the state file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Durable key-value store persisted as a single TOML file.
pub struct TomlStateStore {
    path: PathBuf,
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl TomlStateStore {
    /// Opens the store at `path`, loading any existing state.
    ///
    /// A missing or empty file opens as an empty store; an unreadable file
    /// is an error so a corrupt mirror is noticed instead of silently
    /// discarded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = Self::load_entries(&path)?;
        Ok(Self {
            path,
            entries: Arc::new(Mutex::new(entries)),
        })
    }

    /// Opens the store at the default platform location.
    pub fn default_location() -> Result<Self> {
        let path = SolacePaths::state_file()
            .map_err(|e| SolaceError::config(e.to_string()))?;
        Self::open(path)
    }

    fn load_entries(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let file: StateFile = toml::from_str(&content)?;
        Ok(file.entries)
    }

    /// Rewrites the state file atomically: serialize, write to a sibling
    /// temp file, fsync, rename over the target. An advisory lock on a
    /// sibling lock file keeps concurrent processes from interleaving.
    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let _lock = StateFileLock::acquire(&self.path)?;

        let file = StateFile {
            entries: entries.clone(),
        };
        let toml_string = toml::to_string_pretty(&file)?;

        let tmp_path = self.path.with_extension("toml.tmp");
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl LocalStore for TomlStateStore {
    async fn get(&self, key: &StateKey) -> Result<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(&key.storage_key()).cloned())
    }

    async fn put(&self, key: &StateKey, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.storage_key(), value.to_string());
        self.persist(&entries)
            .map_err(|e| SolaceError::data_access(format!("put {}: {e}", key.storage_key())))
    }

    async fn remove(&self, key: &StateKey) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(&key.storage_key()).is_none() {
            return Ok(());
        }
        self.persist(&entries)
            .map_err(|e| SolaceError::data_access(format!("remove {}: {e}", key.storage_key())))
    }
}

/// Advisory lock guard; the lock file is removed best-effort on drop.
struct StateFileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl StateFileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        file.lock_exclusive()
            .map_err(|e| SolaceError::data_access(format!("failed to acquire state lock: {e}")))?;
        Ok(Self { file, lock_path })
    }
}

impl Drop for StateFileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
