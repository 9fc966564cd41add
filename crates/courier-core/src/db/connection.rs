//! Database connection management

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tokio::sync::{Mutex, MutexGuard};

use super::migrations;
use crate::error::{Error, Result};

/// The local store: a single `SQLite` connection shared by the repository and
/// the sync engine.
///
/// All access goes through [`Database::connection`], which serializes callers
/// so that only one transaction is ever open at a time.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open a database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::debug!("Opening store at {}", path.display());
        let conn = Connection::open(path)?;
        Self::bootstrap(conn, Some(path.to_path_buf()))
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn, None)
    }

    fn bootstrap(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        configure(&conn)?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Acquire the connection. Waiting here yields to other tasks.
    pub async fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    /// Acquire the connection from synchronous test code.
    #[cfg(test)]
    pub(crate) fn connection_blocking(&self) -> MutexGuard<'_, Connection> {
        self.conn.blocking_lock()
    }

    /// Filesystem location, or `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Set durability pragmas. Must run outside any transaction: `SQLite` refuses
/// to change the journal mode while one is open.
fn configure(conn: &Connection) -> Result<()> {
    let journal_mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!("Store journal mode: {journal_mode}");

    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

/// Read the persisted schema version (`PRAGMA user_version`).
pub fn schema_version(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Overwrite the persisted schema version.
pub fn set_schema_version(conn: &Connection, version: i64) -> Result<()> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

/// Run `f` inside an immediate write transaction.
///
/// Commits when `f` succeeds. On any error the transaction is rolled back
/// before the error is returned; a panic inside `f` rolls back when the
/// transaction is dropped. `SQLite` failures are reported as
/// [`Error::Transaction`] tagged with `operation`.
pub fn with_transaction<T, F>(conn: &Connection, operation: &'static str, f: F) -> Result<T>
where
    F: FnOnce(&Transaction<'_>) -> Result<T>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|source| Error::Transaction { operation, source })?;

    match f(&tx) {
        Ok(value) => {
            tx.commit()
                .map_err(|source| Error::Transaction { operation, source })?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback() {
                tracing::error!("Rollback of '{operation}' failed: {rollback_error}");
            }
            tracing::debug!("Transaction '{operation}' rolled back: {error}");
            Err(match error {
                Error::Sqlite(source) => Error::Transaction { operation, source },
                other => other,
            })
        }
    }
}
