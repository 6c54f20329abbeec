//! History persistence
//!
//! A [`HistoryStore`] serializes version histories over a pluggable
//! [`StorageBackend`]: one UTF-8 JSON artifact per source id. The store owns
//! the recovery policy: an absent artifact and an unreadable one both load
//! as an empty history, while an unreachable backend is a hard error.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::Result;
use crate::schema::History;

/// Byte-oriented persistence for one artifact per source id
pub trait StorageBackend {
    /// Read the artifact for `source_id`; `Ok(None)` when none exists.
    ///
    /// Unreachability (permissions, I/O failure) is an error; only a
    /// genuinely absent artifact maps to `None`.
    fn read(&self, source_id: &str) -> Result<Option<String>>;

    /// Fully overwrite the artifact for `source_id`, creating the containing
    /// location if needed. Must never leave a partially written artifact
    /// readable as valid.
    fn write(&self, source_id: &str, contents: &str) -> Result<()>;
}

/// File-backed storage: `<root>/<source_id>.json`
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, source_id: &str) -> PathBuf {
        self.root.join(format!("{source_id}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, source_id: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.artifact_path(source_id)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, source_id: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.artifact_path(source_id);
        // Write-to-temp-then-rename so a crash mid-write cannot leave a
        // truncated artifact that still parses
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory storage for tests
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, source_id: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().expect("memory backend lock poisoned");
        Ok(entries.get(source_id).cloned())
    }

    fn write(&self, source_id: &str, contents: &str) -> Result<()> {
        let mut entries = self.entries.lock().expect("memory backend lock poisoned");
        entries.insert(source_id.to_owned(), contents.to_owned());
        Ok(())
    }
}

/// Loads and saves version histories over a storage backend
pub struct HistoryStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> HistoryStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Load the history for `source_id`
    ///
    /// Absent, unparseable, and checksum-failing artifacts all load as an
    /// empty history: the corrupted bytes are abandoned, and the next
    /// registration starts the source's history over. Backend
    /// unreachability propagates as [`crate::DriftError::StorageUnavailable`].
    pub fn load(&self, source_id: &str) -> Result<History> {
        let Some(raw) = self.backend.read(source_id)? else {
            return Ok(History::default());
        };
        match serde_json::from_str::<History>(&raw) {
            Ok(history) if history.verify() => Ok(history),
            Ok(_) => {
                warn!(source_id, "stored history failed checksum verification, starting fresh");
                Ok(History::default())
            }
            Err(err) => {
                warn!(source_id, error = %err, "stored history is unreadable, starting fresh");
                Ok(History::default())
            }
        }
    }

    /// Persist the full history for `source_id`, overwriting any prior artifact
    pub fn save(&self, source_id: &str, history: &History) -> Result<()> {
        let contents = serde_json::to_string_pretty(history)?;
        self.backend.write(source_id, &contents)
    }
}
