use hashfs::storage::{FileRecord, PriorRecord, Store};
use tempfile::tempdir;

fn make_record(path: &str, size: i64, hash: Option<&str>) -> FileRecord {
    FileRecord {
        path: path.to_string(),
        size,
        modified: "2024-05-01T12:00:00.000000000Z".to_string(),
        hash: hash.map(str::to_string),
    }
}

#[test]
fn test_ensure_schema_is_idempotent() {
    let store = Store::open_in_memory().unwrap();
    store.upsert(&make_record("/a", 1, Some("x"))).unwrap();
    store.ensure_schema().unwrap();
    store.ensure_schema().unwrap();
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_upsert_replaces_whole_row() {
    let store = Store::open_in_memory().unwrap();
    store.upsert(&make_record("/a", 1, Some("old"))).unwrap();

    let mut updated = make_record("/a", 2, None);
    updated.modified = "2024-06-01T00:00:00.000000000Z".to_string();
    store.upsert(&updated).unwrap();

    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.lookup("/a").unwrap(), Some(updated));
}

#[test]
fn test_delete_present_and_absent() {
    let store = Store::open_in_memory().unwrap();
    store.upsert(&make_record("/a", 1, Some("h"))).unwrap();

    assert!(store.delete("/a").unwrap());
    assert!(!store.delete("/a").unwrap());
    assert!(!store.delete("/never").unwrap());
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_load_all_flags_missing_hashes() {
    let store = Store::open_in_memory().unwrap();
    store.upsert(&make_record("/ok", 10, Some("abc"))).unwrap();
    store.upsert(&make_record("/empty", 0, Some(""))).unwrap();
    store.upsert(&make_record("/failed", 5, None)).unwrap();

    let snapshot = store.load_all().unwrap();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(
        snapshot.take("/ok"),
        Some(PriorRecord {
            size: 10,
            modified: "2024-05-01T12:00:00.000000000Z".to_string(),
            hash_missing: false,
        })
    );
    assert!(!snapshot.take("/empty").unwrap().hash_missing);
    assert!(snapshot.take("/failed").unwrap().hash_missing);
    assert!(snapshot.is_empty());
}

#[test]
fn test_for_each_entry_visits_all_rows() {
    let store = Store::open_in_memory().unwrap();
    store.upsert(&make_record("x/1", 100, Some("a"))).unwrap();
    store.upsert(&make_record("x/2", 200, None)).unwrap();

    let mut seen = Vec::new();
    store
        .for_each_entry(|path, size| seen.push((path.to_string(), size)))
        .unwrap();
    seen.sort();
    assert_eq!(
        seen,
        vec![("x/1".to_string(), 100), ("x/2".to_string(), 200)]
    );
}

#[test]
fn test_reopen_keeps_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hashes.db");
    {
        let store = Store::open(path.to_str().unwrap()).unwrap();
        store.upsert(&make_record("kept", 3, Some("h"))).unwrap();
    }
    let store = Store::open(path.to_str().unwrap()).unwrap();
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.lookup("kept").unwrap().unwrap().size, 3);
}

#[test]
fn test_concurrent_upserts() {
    let store = std::sync::Arc::new(Store::open_in_memory().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = std::sync::Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..50 {
                    let path = format!("t{}/f{}", t, i);
                    store.upsert(&make_record(&path, i, Some("h"))).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.count().unwrap(), 200);
}
