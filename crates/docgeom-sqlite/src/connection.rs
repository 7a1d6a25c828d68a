//! SQLite connection management
//!
//! Uses a simple Arc<Mutex<Connection>> pattern; the migration is a single
//! sequential writer.

use crate::error::{SqliteError, SqliteResult};
use crate::schema::{self, OutputTable};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Path that opens a private in-memory database
pub const MEMORY_PATH: &str = ":memory:";

/// Thread-safe SQLite connection wrapper
#[derive(Clone)]
pub struct SqlitePool {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl std::fmt::Debug for SqlitePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePool").field("path", &self.path).finish()
    }
}

impl SqlitePool {
    /// Open (or create) the database at `path` and migrate `output`
    pub fn open(
        path: impl AsRef<Path>,
        output: &OutputTable,
        busy_timeout: Duration,
    ) -> SqliteResult<Self> {
        let path = path.as_ref().to_path_buf();
        info!(path = ?path, "Opening SQLite database");

        let in_memory = path.as_os_str() == MEMORY_PATH;
        let conn = if in_memory {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SqliteError::Connection(format!("Failed to create directory: {}", e))
                })?;
            }
            Connection::open(&path)?
        };

        let pool = Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        };
        pool.initialize(output, busy_timeout, !in_memory)?;
        Ok(pool)
    }

    /// In-memory database with the default output table
    pub fn memory() -> SqliteResult<Self> {
        Self::open(
            MEMORY_PATH,
            &OutputTable::new("DocumentGeometry", "Geometry")?,
            Duration::from_secs(5),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute a closure with the connection
    pub fn with_connection<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&Connection) -> SqliteResult<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Execute a closure with mutable access to the connection
    pub fn with_connection_mut<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&mut Connection) -> SqliteResult<T>,
    {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }

    fn initialize(
        &self,
        output: &OutputTable,
        busy_timeout: Duration,
        wal_mode: bool,
    ) -> SqliteResult<()> {
        self.with_connection(|conn| {
            debug!("Configuring SQLite pragmas");
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
            }
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA temp_store = MEMORY;")?;

            schema::apply_migrations(conn, output)?;
            info!("SQLite database initialized successfully");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_pool() {
        let pool = SqlitePool::memory().expect("Failed to create memory pool");

        pool.with_connection(|conn| {
            let result: i64 = conn.query_row("SELECT 1 + 1", [], |row| row.get(0))?;
            assert_eq!(result, 2);
            Ok(())
        })
        .expect("Query failed");
    }

    #[test]
    fn test_file_pool_creates_parent_and_uses_wal() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("out.db");

        let output = OutputTable::new("DocumentGeometry", "Geometry").unwrap();
        let pool = SqlitePool::open(&db_path, &output, Duration::from_secs(1))
            .expect("Failed to create pool");
        assert!(db_path.exists());

        pool.with_connection(|conn| {
            let mode: String = conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))?;
            assert_eq!(mode.to_lowercase(), "wal");
            Ok(())
        })
        .expect("Query failed");
    }
}
