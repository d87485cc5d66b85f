use super::models::{FileRecord, PriorRecord};
use super::snapshot::Snapshot;
use super::sqlite::Store;
use rusqlite::{params, OptionalExtension, Result};
use std::time::{Duration, Instant};
use tracing::info;

const LOAD_PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

impl Store {
    /// Read every record into a fresh snapshot. The digest itself is not
    /// loaded, only whether it is missing.
    pub fn load_all(&self) -> Result<Snapshot> {
        self.load_all_with_progress(LOAD_PROGRESS_INTERVAL)
    }

    pub fn load_all_with_progress(&self, interval: Duration) -> Result<Snapshot> {
        let snapshot = Snapshot::new();
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT path, size, modified, hash IS NULL FROM files")?;
        let mut rows = stmt.query([])?;

        let mut last_report = Instant::now();
        let mut entries: u64 = 0;
        while let Some(row) = rows.next()? {
            let path: String = row.get(0)?;
            let prior = PriorRecord {
                size: row.get(1)?,
                modified: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                hash_missing: row.get(3)?,
            };
            snapshot.insert(path, prior);
            entries += 1;

            if last_report.elapsed() > interval {
                info!("Read: {}", entries / 1000 * 1000);
                last_report = Instant::now();
            }
        }

        info!("Read: {}", snapshot.len());
        Ok(snapshot)
    }

    pub fn lookup(&self, path: &str) -> Result<Option<FileRecord>> {
        self.connection()
            .query_row(
                "SELECT path, size, modified, hash FROM files WHERE path = ?1",
                params![path],
                |row| {
                    Ok(FileRecord {
                        path: row.get(0)?,
                        size: row.get(1)?,
                        modified: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        hash: row.get(3)?,
                    })
                },
            )
            .optional()
    }

    /// Insert or replace the row for `record.path`; all columns in one statement.
    pub fn upsert(&self, record: &FileRecord) -> Result<()> {
        let conn = self.connection();
        let mut stmt = conn.prepare_cached(
            "INSERT OR REPLACE INTO files(path, size, modified, hash) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![
            record.path,
            record.size,
            record.modified,
            record.hash
        ])?;
        Ok(())
    }

    /// Returns whether a row was removed. A missing row is not an error.
    pub fn delete(&self, path: &str) -> Result<bool> {
        let conn = self.connection();
        let mut stmt = conn.prepare_cached("DELETE FROM files WHERE path = ?1")?;
        let removed = stmt.execute(params![path])?;
        Ok(removed > 0)
    }

    pub fn count(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
    }

    /// Visit (path, size) for every row, in table order.
    pub fn for_each_entry<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&str, i64),
    {
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT path, size FROM files")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let path: String = row.get(0)?;
            let size: Option<i64> = row.get(1)?;
            f(&path, size.unwrap_or(0));
        }
        Ok(())
    }
}
