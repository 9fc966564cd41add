//! Database migrations
//!
//! Migrations are applied in order, each in its own transaction. The schema
//! version (`PRAGMA user_version`) is advanced inside that transaction, so a
//! crash before commit leaves both the schema and the version untouched and
//! the next start retries the same migration. Statements must therefore be
//! safe to re-apply.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use super::connection::schema_version;
use crate::error::{Error, Result};

/// One forward-only schema step
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub description: &'static str,
    pub sql: &'static str,
}

/// Known migrations. Version N is `MIGRATIONS[N - 1]`.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        description: "orders, order items and sync queue",
        sql: "
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY NOT NULL,
            code TEXT NOT NULL,
            status TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            synced INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS order_items (
            id TEXT PRIMARY KEY NOT NULL,
            order_id TEXT NOT NULL REFERENCES orders(id),
            name TEXT NOT NULL,
            qty INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sync_queue (
            id TEXT PRIMARY KEY NOT NULL,
            type TEXT NOT NULL,
            payload TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            synced INTEGER NOT NULL DEFAULT 0
        );
        ",
    },
    Migration {
        description: "replay and listing indexes",
        sql: "
        CREATE INDEX IF NOT EXISTS idx_sync_queue_pending ON sync_queue(synced, created_at);
        CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id);
        CREATE INDEX IF NOT EXISTS idx_orders_updated ON orders(updated_at DESC);
        ",
    },
];

/// Highest schema version this build knows about
pub fn latest_version() -> i64 {
    i64::try_from(MIGRATIONS.len()).unwrap_or(i64::MAX)
}

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    apply(conn, MIGRATIONS)
}

pub(crate) fn apply(conn: &Connection, migrations: &[Migration]) -> Result<()> {
    let known = i64::try_from(migrations.len()).unwrap_or(i64::MAX);
    let current = schema_version(conn)?;

    if current > known {
        return Err(Error::StoreNewerThanCode {
            persisted: current,
            known,
        });
    }

    if current == known {
        tracing::debug!("Store schema up to date (v{current})");
        return Ok(());
    }

    tracing::info!("Migrating store from v{current} to v{known}");

    let already_applied = usize::try_from(current).unwrap_or(0);
    for (version, migration) in (1_i64..).zip(migrations).skip(already_applied) {
        apply_one(conn, version, migration)?;
        tracing::info!(
            "Migrated store to version {version} ({})",
            migration.description
        );
    }

    Ok(())
}

fn apply_one(conn: &Connection, version: i64, migration: &Migration) -> Result<()> {
    let to_migration_error = |source| Error::Migration { version, source };

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(to_migration_error)?;
    tx.execute_batch(migration.sql).map_err(to_migration_error)?;
    tx.pragma_update(None, "user_version", version)
        .map_err(to_migration_error)?;
    tx.commit().map_err(to_migration_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::set_schema_version;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            != 0
    }

    #[test]
    fn test_migrations() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), latest_version());
        assert!(table_exists(&conn, "orders"));
        assert!(table_exists(&conn, "order_items"));
        assert!(table_exists(&conn, "sync_queue"));
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap(); // Should not fail

        assert_eq!(schema_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn test_newer_store_is_fatal() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        set_schema_version(&conn, latest_version() + 1).unwrap();

        let error = run(&conn).unwrap_err();
        assert!(error.is_fatal());
        assert!(matches!(
            error,
            Error::StoreNewerThanCode { persisted, known }
                if persisted == latest_version() + 1 && known == latest_version()
        ));
        // Never downgraded
        assert_eq!(schema_version(&conn).unwrap(), latest_version() + 1);
    }

    #[test]
    fn test_failed_migration_leaves_version_and_schema_untouched() {
        let conn = Connection::open_in_memory().unwrap();
        let broken = [
            MIGRATIONS[0],
            Migration {
                description: "half applied",
                sql: "CREATE TABLE IF NOT EXISTS audit (id TEXT PRIMARY KEY);
                      INSERT INTO missing_table VALUES (1);",
            },
        ];

        let error = apply(&conn, &broken).unwrap_err();
        assert!(matches!(error, Error::Migration { version: 2, .. }));
        assert_eq!(schema_version(&conn).unwrap(), 1);
        // The first statement of the failed migration was rolled back too
        assert!(!table_exists(&conn, "audit"));

        // Next start with the fixed migration retries only v2
        let fixed = [
            MIGRATIONS[0],
            Migration {
                description: "fixed",
                sql: "CREATE TABLE IF NOT EXISTS audit (id TEXT PRIMARY KEY);",
            },
        ];
        apply(&conn, &fixed).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
        assert!(table_exists(&conn, "audit"));
    }

    #[test]
    fn test_reapplying_migrations_over_existing_schema_is_safe() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute(
            "INSERT INTO orders (id, code, status, updated_at, synced) VALUES ('a', 'ORD-1', 'PENDING', 1, 1)",
            [],
        )
        .unwrap();

        // Simulate a crash that lost the version bump but kept the tables
        set_schema_version(&conn, 0).unwrap();
        run(&conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), latest_version());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
