use super::classify::{classify, Outcome};
use crate::hasher::{ContentHasher, EMPTY_FILE_HASH};
use crate::scanner::relative_key;
use crate::storage::{FileRecord, Snapshot, Store};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{error, warn};

/// How one unit of work ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitReport {
    Classified {
        outcome: Outcome,
        hash_failed: bool,
        store_failed: bool,
    },
    /// The file's metadata could not be read. A vanished file keeps its
    /// snapshot entry for reconciliation; any other failure consumes the entry
    /// and keeps the stored row with its hash cleared.
    Unavailable,
}

/// Processes single files: observe, classify, hash when stale, write through.
pub struct FileIndexer {
    root: PathBuf,
    store: Arc<Store>,
    snapshot: Arc<Snapshot>,
    hasher: Arc<dyn ContentHasher>,
}

impl FileIndexer {
    pub fn new(
        root: impl Into<PathBuf>,
        store: Arc<Store>,
        snapshot: Arc<Snapshot>,
        hasher: Arc<dyn ContentHasher>,
    ) -> Self {
        Self {
            root: root.into(),
            store,
            snapshot,
            hasher,
        }
    }

    pub fn process(&self, path: &Path) -> UnitReport {
        let key = relative_key(&self.root, path);
        let (size, modified) = match observe(path) {
            Ok(observed) => observed,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("File vanished before it was read: {}", path.display());
                return UnitReport::Unavailable;
            }
            Err(e) => {
                warn!("Unable to read metadata for {}: {}", path.display(), e);
                self.keep_unreadable(key);
                return UnitReport::Unavailable;
            }
        };

        let prior = self.snapshot.take(&key);
        let outcome = classify(size, &modified, prior.as_ref());

        let mut hash_failed = false;
        let hash = match outcome {
            Outcome::Cached => {
                return UnitReport::Classified {
                    outcome,
                    hash_failed: false,
                    store_failed: false,
                }
            }
            Outcome::ZeroLength => Some(EMPTY_FILE_HASH.to_string()),
            Outcome::NewlyHashed
            | Outcome::RehashedDueToSize
            | Outcome::RehashedDueToModifiedDate => match self.hasher.hash(path) {
                Ok(digest) => Some(digest),
                Err(e) => {
                    warn!("Unable to hash {}: {}", path.display(), e);
                    hash_failed = true;
                    None
                }
            },
        };

        let record = FileRecord {
            path: key,
            size,
            modified,
            hash,
        };
        let store_failed = match self.store.upsert(&record) {
            Ok(()) => false,
            Err(e) => {
                error!("Error writing record for {}: {}", record.path, e);
                true
            }
        };

        UnitReport::Classified {
            outcome,
            hash_failed,
            store_failed,
        }
    }

    /// The path exists but cannot be stat'ed: confirm it so reconciliation
    /// leaves it alone, and clear its hash so the next run rehashes it.
    fn keep_unreadable(&self, key: String) {
        let Some(prior) = self.snapshot.take(&key) else {
            return;
        };
        let record = FileRecord {
            path: key,
            size: prior.size,
            modified: prior.modified,
            hash: None,
        };
        if let Err(e) = self.store.upsert(&record) {
            error!("Error writing record for {}: {}", record.path, e);
        }
    }
}

fn observe(path: &Path) -> io::Result<(i64, String)> {
    let metadata = fs::metadata(path)?;
    let size = i64::try_from(metadata.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "file size exceeds i64"))?;
    let modified = format_modified(metadata.modified()?);
    Ok((size, modified))
}

/// Render a modification time as a round-trip stable RFC 3339 string.
pub fn format_modified(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Nanos, true)
}
