//! Session-scoped "intro seen" flag.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tracing::debug;

use crate::error::StorageError;

/// Value written under the session key once the intro has been shown.
pub const SEEN_VALUE: &str = "true";

/// Key/value storage living as long as one browsing session.
pub trait SessionStore: Send + Sync {
    /// Reads `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Session storage held in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, String>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Session storage persisted as a JSON object of strings.
///
/// Lets separate CLI invocations share one "session". A missing file is an
/// empty session.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStore {
    /// Opens the session file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file exists but cannot be read,
    /// or [`StorageError::Corrupt`] if it is not a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "session file not found, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        let json = serde_json::to_string_pretty(&*entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Whether the intro has been shown in this session.
///
/// Read once at load; [`mark_seen`](Self::mark_seen) writes the store at
/// most once per page load.
pub struct GateState {
    store: Arc<dyn SessionStore>,
    key: String,
    seen: AtomicBool,
}

impl std::fmt::Debug for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateState")
            .field("key", &self.key)
            .field("seen", &self.is_seen())
            .finish_non_exhaustive()
    }
}

impl GateState {
    /// Reads the flag under `key`. Anything other than `"true"` counts as
    /// not seen.
    #[must_use]
    pub fn load(store: Arc<dyn SessionStore>, key: &str) -> Self {
        let seen = store.get(key).as_deref() == Some(SEEN_VALUE);
        debug!(key, seen, "gate state loaded");
        Self {
            store,
            key: key.to_owned(),
            seen: AtomicBool::new(seen),
        }
    }

    #[must_use]
    pub fn is_seen(&self) -> bool {
        self.seen.load(Ordering::SeqCst)
    }

    /// Records that the intro has been shown.
    ///
    /// Returns `Ok(true)` when this call wrote the flag and `Ok(false)` when
    /// it was already set. The in-memory flag is set even if the write
    /// fails.
    ///
    /// # Errors
    ///
    /// Propagates the store's write failure.
    pub fn mark_seen(&self) -> Result<bool, StorageError> {
        if self.seen.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        self.store.set(&self.key, SEEN_VALUE)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    const KEY: &str = "oshsharohi_intro_seen";

    #[derive(Default)]
    struct CountingStore {
        inner: MemorySessionStore,
        writes: AtomicUsize,
    }

    impl SessionStore for CountingStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_absent_flag_is_not_seen() {
        let gate = GateState::load(Arc::new(MemorySessionStore::new()), KEY);
        assert!(!gate.is_seen());
    }

    #[test]
    fn test_only_true_counts_as_seen() {
        let store = Arc::new(MemorySessionStore::new());
        store.set(KEY, "yes").unwrap();
        assert!(!GateState::load(store.clone(), KEY).is_seen());
        store.set(KEY, "true").unwrap();
        assert!(GateState::load(store, KEY).is_seen());
    }

    #[test]
    fn test_mark_seen_writes_once() {
        let store = Arc::new(CountingStore::default());
        let gate = GateState::load(store.clone(), KEY);
        assert!(gate.mark_seen().unwrap());
        assert!(!gate.mark_seen().unwrap());
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(store.get(KEY).as_deref(), Some("true"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        assert_eq!(store.get(KEY), None);
        store.set(KEY, "true").unwrap();

        let reopened = FileSessionStore::open(&path).unwrap();
        assert_eq!(reopened.get(KEY).as_deref(), Some("true"));
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            FileSessionStore::open(&path),
            Err(StorageError::Corrupt(_))
        ));
    }

    #[test]
    fn test_file_store_empty_file_is_empty_session() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = FileSessionStore::open(file.path()).unwrap();
        assert_eq!(store.get(KEY), None);
    }
}
