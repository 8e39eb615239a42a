//! Injectable key-value store for client-side persistence.
//!
//! Holds the auth token and per-ticket edit drafts. The trait keeps the
//! cache and mutation layers storage-agnostic: the CLI wires up the
//! file-backed store, tests use the in-memory one. Lifecycle: the token
//! is removed on logout, drafts are swept on application start.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};

/// Key the bearer token is stored under.
pub const TOKEN_KEY: &str = "token";

/// Prefix for unsaved ticket edits, keyed per ticket id.
pub const DRAFT_PREFIX: &str = "ticket-draft-";

pub fn draft_key(ticket_id: i64) -> String {
    format!("{}{}", DRAFT_PREFIX, ticket_id)
}

pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Vec<String>;
}

/// Remove every ticket draft. Called once on application start.
pub fn clear_drafts(kv: &dyn KvStore) -> Result<()> {
    for key in kv.keys() {
        if key.starts_with(DRAFT_PREFIX) {
            kv.remove(&key)?;
        }
    }
    Ok(())
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

/// File-backed store: one JSON object, rewritten whole on every change.
/// The values are small (a token and a handful of drafts), so whole-file
/// writes keep the format trivially inspectable.
pub struct FileKv {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileKv {
    /// Open the store at `path`, creating parent directories. A missing
    /// file starts empty and is created on first write.
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory {}", parent.display())
            })?;
        }
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("State file {} is not valid JSON", path.display()))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write state file {}", self.path.display()))?;
        Ok(())
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.lock();
        entries.remove(key);
        self.persist(&entries)
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}
