use super::models::PriorRecord;
use dashmap::DashMap;

/// In-memory copy of the store taken at the start of a run.
///
/// Workers remove each path they observe; whatever is left after the walk was
/// never seen and is handed to reconciliation.
#[derive(Debug, Default)]
pub struct Snapshot {
    entries: DashMap<String, PriorRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: String, prior: PriorRecord) {
        self.entries.insert(path, prior);
    }

    /// Atomically remove and return the entry for `path`, if present.
    pub fn take(&self, path: &str) -> Option<PriorRecord> {
        self.entries.remove(path).map(|(_, prior)| prior)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths still present, sorted.
    pub fn remaining_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prior(size: i64) -> PriorRecord {
        PriorRecord {
            size,
            modified: "2024-01-01T00:00:00Z".to_string(),
            hash_missing: false,
        }
    }

    #[test]
    fn test_take_removes_once() {
        let snapshot = Snapshot::new();
        snapshot.insert("a/b.txt".to_string(), prior(4));

        assert_eq!(snapshot.take("a/b.txt"), Some(prior(4)));
        assert_eq!(snapshot.take("a/b.txt"), None);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_remaining_paths_sorted() {
        let snapshot = Snapshot::new();
        snapshot.insert("z".to_string(), prior(1));
        snapshot.insert("a".to_string(), prior(2));
        snapshot.insert("m".to_string(), prior(3));
        snapshot.take("m");

        assert_eq!(snapshot.remaining_paths(), vec!["a".to_string(), "z".to_string()]);
    }
}
