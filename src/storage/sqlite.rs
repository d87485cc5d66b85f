use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, Result};
use tracing::debug;

/// The persisted path index. All access goes through one connection behind a
/// mutex, so concurrent workers share a single writer lane.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Store {
            conn: Mutex::new(conn),
        };
        store.configure_pragmas()?;
        store.ensure_schema()?;
        debug!("Opened store '{}'", path);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Store {
            conn: Mutex::new(conn),
        };
        store.configure_pragmas()?;
        store.ensure_schema()?;
        Ok(store)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.connection().execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("SQLite pragmas configured (WAL mode, 64MB cache)");
        Ok(())
    }

    /// Create the `files` table if it does not exist yet. Safe to call repeatedly.
    pub fn ensure_schema(&self) -> Result<()> {
        self.connection().execute_batch(
            "CREATE TABLE IF NOT EXISTS files(
                path TEXT PRIMARY KEY,
                size INTEGER,
                modified TEXT,
                hash TEXT
            );",
        )?;
        Ok(())
    }

    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    pub fn sqlite_version() -> &'static str {
        rusqlite::version()
    }
}
