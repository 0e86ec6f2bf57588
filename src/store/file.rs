//! JSON-file result store
//!
//! Layout: `<data_dir>/user_history/<user>.json`, each file a pretty-printed
//! JSON array of results, oldest first. Writes go to a temporary sibling
//! and are renamed into place, so a crash mid-write leaves the previous
//! history intact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;
use crate::session::{SessionResult, UserId};
use crate::store::ResultStore;

/// Longest file stem written. Keeps `<stem>.json.tmp` inside the usual
/// 255-byte file name limit.
const MAX_STEM_LEN: usize = 240;

/// Result store writing one JSON file per user.
///
/// Read-modify-write cycles for a user run under that user's async mutex,
/// keyed by file name. A lock is dropped from the map once no task holds
/// it. The locks live in this instance, so a data directory should be
/// served by a single store per process.
#[derive(Debug)]
pub struct JsonFileResultStore {
    root: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl JsonFileResultStore {
    /// Creates a store rooted at `data_dir`. Nothing is created on disk
    /// until the first append.
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().join("user_history"),
            locks: DashMap::new(),
        }
    }

    /// Directory holding the per-user history files.
    #[must_use]
    pub fn history_dir(&self) -> &Path {
        &self.root
    }

    /// History file for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUser`] if the id is empty or too long
    /// to fit in a file name.
    pub fn history_path(&self, user: &UserId) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(format!("{}.json", file_stem(user)?)))
    }

    fn lock_for(&self, stem: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(stem.to_string()).or_default().value())
    }

    fn release(&self, stem: &str, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks.remove_if(stem, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// File stem for `user`.
///
/// Ids made only of lowercase ASCII letters, digits, `-`, `_`, `.` and `@`
/// that do not start with a dot are used as they are. Any other id is
/// written as `~` followed by the lowercase hex of its UTF-8 bytes, so
/// distinct ids never share a file, even on a case-insensitive filesystem.
///
/// # Errors
///
/// Returns [`StoreError::InvalidUser`] for an empty id or one whose stem
/// would exceed the file name limit.
pub fn file_stem(user: &UserId) -> Result<String, StoreError> {
    let id = user.as_str();
    if id.is_empty() {
        return Err(StoreError::InvalidUser(id.to_string()));
    }

    let plain = !id.starts_with('.')
        && id.bytes().all(|b| {
            b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'-' | b'_' | b'.' | b'@')
        });
    let stem = if plain {
        id.to_string()
    } else {
        format!("~{}", hex::encode(id.as_bytes()))
    };

    if stem.len() > MAX_STEM_LEN {
        return Err(StoreError::InvalidUser(id.to_string()));
    }
    Ok(stem)
}

#[async_trait]
impl ResultStore for JsonFileResultStore {
    async fn append(&self, user: &UserId, result: SessionResult) -> Result<(), StoreError> {
        let stem = file_stem(user)?;
        let path = self.root.join(format!("{stem}.json"));
        let lock = self.lock_for(&stem);

        let outcome = {
            let _guard = lock.lock().await;
            match read_history(&path).await {
                Ok(mut history) => {
                    history.push(result);
                    write_history(&path, &history).await.map(|()| history.len())
                }
                Err(e) => Err(e),
            }
        };
        self.release(&stem, lock);

        let entries = outcome?;
        debug!(user = %user, entries, path = %path.display(), "result appended");
        Ok(())
    }

    async fn list(&self, user: &UserId) -> Result<Vec<SessionResult>, StoreError> {
        let stem = file_stem(user)?;
        let path = self.root.join(format!("{stem}.json"));
        let lock = self.lock_for(&stem);

        let outcome = {
            let _guard = lock.lock().await;
            read_history(&path).await
        };
        self.release(&stem, lock);
        outcome
    }
}

async fn read_history(path: &Path) -> Result<Vec<SessionResult>, StoreError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&contents).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_history(path: &Path, history: &[SessionResult]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut bytes = serde_json::to_vec_pretty(history).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    bytes.push(b'\n');

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &bytes).await.map_err(io_err)?;

    match tokio::fs::rename(&temp_path, path).await {
        Ok(()) => Ok(()),
        Err(_) if path.exists() => {
            let _ = tokio::fs::remove_file(path).await;
            tokio::fs::rename(&temp_path, path).await.map_err(io_err)
        }
        Err(e) => Err(io_err(e)),
    }
}
