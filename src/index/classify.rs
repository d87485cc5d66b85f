use crate::storage::PriorRecord;
use std::fmt;

/// What a unit of work decided about one observed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Size and modified time match the stored record; nothing read or written.
    Cached,
    /// No prior record (or no usable digest); hashed and stored.
    NewlyHashed,
    RehashedDueToSize,
    RehashedDueToModifiedDate,
    /// Empty file; the empty-hash sentinel is stored without reading it.
    ZeroLength,
}

impl Outcome {
    pub const ALL: [Outcome; 5] = [
        Outcome::Cached,
        Outcome::NewlyHashed,
        Outcome::RehashedDueToSize,
        Outcome::RehashedDueToModifiedDate,
        Outcome::ZeroLength,
    ];

    /// Whether this outcome requires reading the file's content.
    pub fn needs_hash(self) -> bool {
        match self {
            Outcome::Cached | Outcome::ZeroLength => false,
            Outcome::NewlyHashed
            | Outcome::RehashedDueToSize
            | Outcome::RehashedDueToModifiedDate => true,
        }
    }

    /// Whether this outcome writes a row.
    pub fn needs_write(self) -> bool {
        !matches!(self, Outcome::Cached)
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Cached => "cached",
            Outcome::NewlyHashed => "new",
            Outcome::RehashedDueToSize => "size",
            Outcome::RehashedDueToModifiedDate => "modified",
            Outcome::ZeroLength => "empty",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decide whether an observed file needs hashing.
///
/// A full metadata match is `Cached` unless the stored digest is missing, in
/// which case the file is hashed again as `NewlyHashed`. A size difference is
/// reported before a timestamp difference.
pub fn classify(size: i64, modified: &str, prior: Option<&PriorRecord>) -> Outcome {
    let (same_size, same_modified) = match prior {
        Some(prior) => (prior.size == size, prior.modified == modified),
        None => (true, true),
    };

    if let Some(prior) = prior {
        if same_size && same_modified && !prior.hash_missing {
            return Outcome::Cached;
        }
    }

    if size == 0 {
        return Outcome::ZeroLength;
    }

    if !same_size {
        Outcome::RehashedDueToSize
    } else if !same_modified {
        Outcome::RehashedDueToModifiedDate
    } else {
        Outcome::NewlyHashed
    }
}
