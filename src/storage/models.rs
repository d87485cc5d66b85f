/// One row of the `files` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub size: i64,
    /// RFC 3339 UTC timestamp; compared as an opaque string.
    pub modified: String,
    /// `Some("")` for zero-length files, `None` when hashing failed.
    pub hash: Option<String>,
}

/// The part of a stored record the staleness check needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorRecord {
    pub size: i64,
    pub modified: String,
    pub hash_missing: bool,
}
