//! Sync queue storage
//!
//! The queue is an append-only ledger: rows are inserted by the order
//! repository and only ever updated once, when the sync engine flips `synced`.

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{OrderId, StoredQueueItem, SyncOperation, SyncQueueItem};

/// Access to the `sync_queue` table over a borrowed connection or transaction
pub struct SyncQueueRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SyncQueueRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append an unsynced entry for `operation`. Returns the entry id.
    ///
    /// Callers are expected to run this inside the same transaction as the
    /// entity change it describes.
    pub fn enqueue(&self, operation: &SyncOperation, created_at: i64) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        self.conn.execute(
            "INSERT INTO sync_queue (id, type, payload, created_at, synced) VALUES (?1, ?2, ?3, ?4, 0)",
            params![
                id,
                operation.kind().as_str(),
                operation.payload_json()?,
                created_at
            ],
        )?;
        tracing::debug!("Queued {} for order {}", operation.kind(), operation.order_id());
        Ok(id)
    }

    /// Unsynced entries in replay order: `created_at` ascending, insertion
    /// order for equal timestamps.
    pub fn pending(&self) -> Result<Vec<StoredQueueItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, type, payload, created_at, synced
             FROM sync_queue
             WHERE synced = 0
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let items = stmt
            .query_map([], Self::parse_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Entries in replay order, optionally only the unsynced ones.
    pub fn list(&self, limit: usize, pending_only: bool) -> Result<Vec<StoredQueueItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, type, payload, created_at, synced
             FROM sync_queue
             WHERE (?1 = 0 OR synced = 0)
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?2",
        )?;

        let items = stmt
            .query_map(
                params![i64::from(pending_only), limit as i64],
                Self::parse_item,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Number of unsynced entries
    pub fn pending_count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM sync_queue WHERE synced = 0", [], |row| {
                    row.get(0)
                })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Number of unsynced entries referencing `order_id`
    pub fn pending_count_for(&self, order_id: &OrderId) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sync_queue
             WHERE synced = 0 AND json_extract(payload, '$.orderId') = ?1",
            params![order_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Record that the remote confirmed `item`.
    ///
    /// Flips the entry's `synced` flag and, for operations that still have an
    /// order row, marks that order synced once no other unsynced entry
    /// references it. Must run inside a transaction.
    pub fn mark_synced(&self, item: &SyncQueueItem) -> Result<()> {
        self.conn.execute(
            "UPDATE sync_queue SET synced = 1 WHERE id = ?1",
            params![item.id],
        )?;

        if item.operation.kind().touches_order_row() {
            self.conn.execute(
                "UPDATE orders SET synced = 1
                 WHERE id = ?1
                   AND NOT EXISTS (
                       SELECT 1 FROM sync_queue
                       WHERE synced = 0 AND json_extract(payload, '$.orderId') = ?1
                   )",
                params![item.operation.order_id().as_str()],
            )?;
        }

        Ok(())
    }

    fn parse_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredQueueItem> {
        Ok(StoredQueueItem {
            id: row.get(0)?,
            kind: row.get(1)?,
            payload: row.get(2)?,
            created_at: row.get(3)?,
            synced: row.get::<_, i64>(4)? != 0,
        })
    }
}
