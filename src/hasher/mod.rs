pub mod sha256;

use std::io;
use std::path::Path;

pub use sha256::Sha256Hasher;

/// Stored in place of a digest for zero-length files.
pub const EMPTY_FILE_HASH: &str = "";

/// Computes a content digest for a file.
///
/// An `Err` means the content was unavailable (vanished, locked, permission
/// denied). Callers persist that as a missing hash and do not retry.
pub trait ContentHasher: Send + Sync {
    fn hash(&self, path: &Path) -> io::Result<String>;
}
