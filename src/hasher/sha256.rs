use super::ContentHasher;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::trace;

const READ_BUFFER_SIZE: usize = 64 * 1024; // 64KB

/// Streaming SHA-256 over the whole file, rendered as lowercase hex.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn hash(&self, path: &Path) -> io::Result<String> {
        let file = File::open(path)?;
        let digest = hash_reader(file)?;
        trace!("Hashed {}", path.display());
        Ok(digest)
    }
}

pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }

    let digest = hasher.finalize();
    Ok(format!("{digest:x}"))
}
