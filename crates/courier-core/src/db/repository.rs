//! Order repository implementation
//!
//! Every mutation is an offline-first write: the order change and the queue
//! entry describing it are committed in one transaction, so an order mutation
//! is never visible without the entry the sync engine needs to replay it.

use std::collections::HashSet;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::connection::with_transaction;
use super::sync_queue::SyncQueueRepository;
use crate::error::{Error, Result};
use crate::models::{
    CreateOrderPayload, DeleteOrderPayload, NewOrder, Order, OrderDetail, OrderId, OrderItem,
    OrderStatus, SyncOperation, UpdateOrderStatusPayload,
};
use crate::util::now_millis;

/// Trait for order storage operations
pub trait OrderRepository {
    /// Create a new order in `PENDING` and queue its creation
    fn create(&self, input: &NewOrder) -> Result<Order>;

    /// Set an order's status and queue the change, even if the status is unchanged
    fn update_status(&self, id: &OrderId, next_status: OrderStatus) -> Result<Order>;

    /// Delete an order with its items and queue the deletion
    fn delete(&self, id: &OrderId) -> Result<()>;

    /// Delete several orders atomically: all are removed and queued, or none
    fn delete_many(&self, ids: &[OrderId]) -> Result<usize>;

    /// Get an order and its items by ID
    fn get(&self, id: &OrderId) -> Result<Option<OrderDetail>>;

    /// List orders, most recently touched first
    fn list(&self) -> Result<Vec<Order>>;

    /// Attach a line item to an order. Items are local-only and not queued.
    fn add_item(&self, order_id: &OrderId, name: &str, qty: i64) -> Result<OrderItem>;

    /// Insert demo orders when the store is empty. Returns whether it seeded.
    fn seed_if_empty(&self) -> Result<bool>;
}

/// `SQLite` implementation of `OrderRepository`
pub struct SqliteOrderRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteOrderRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Timestamp for the next mutation.
    ///
    /// Never earlier than any stored `updated_at` or `created_at`, so replay
    /// order and `updated_at` stay monotonic if the wall clock steps back.
    fn next_timestamp(conn: &Connection) -> Result<i64> {
        let latest: i64 = conn.query_row(
            "SELECT MAX(
                 COALESCE((SELECT MAX(created_at) FROM sync_queue), 0),
                 COALESCE((SELECT MAX(updated_at) FROM orders), 0)
             )",
            [],
            |row| row.get(0),
        )?;
        Ok(now_millis().max(latest))
    }

    fn remove_order(conn: &Connection, id: &OrderId) -> Result<()> {
        conn.execute(
            "DELETE FROM order_items WHERE order_id = ?1",
            params![id.as_str()],
        )?;
        let rows = conn.execute("DELETE FROM orders WHERE id = ?1", params![id.as_str()])?;
        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn items_for(&self, id: &OrderId) -> Result<Vec<OrderItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, order_id, name, qty FROM order_items WHERE order_id = ?1 ORDER BY rowid",
        )?;
        let items = stmt
            .query_map(params![id.as_str()], Self::parse_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Parse an order from a database row
    fn parse_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
        Ok(Order {
            id: OrderId::from(row.get::<_, String>(0)?),
            code: row.get(1)?,
            status: row.get(2)?,
            updated_at: row.get(3)?,
            synced: row.get::<_, i64>(4)? != 0,
        })
    }

    fn parse_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderItem> {
        Ok(OrderItem {
            id: row.get(0)?,
            order_id: OrderId::from(row.get::<_, String>(1)?),
            name: row.get(2)?,
            qty: row.get(3)?,
        })
    }

    fn insert_item(conn: &Connection, order_id: &OrderId, name: &str, qty: i64) -> Result<OrderItem> {
        let item = OrderItem {
            id: Uuid::now_v7().to_string(),
            order_id: order_id.clone(),
            name: name.to_string(),
            qty,
        };
        conn.execute(
            "INSERT INTO order_items (id, order_id, name, qty) VALUES (?1, ?2, ?3, ?4)",
            params![item.id, item.order_id.as_str(), item.name, item.qty],
        )?;
        Ok(item)
    }
}

impl OrderRepository for SqliteOrderRepository<'_> {
    fn create(&self, input: &NewOrder) -> Result<Order> {
        let code = input.code.trim();
        if code.is_empty() {
            return Err(Error::InvalidInput("order code cannot be empty".into()));
        }

        with_transaction(self.conn, "create_order", |tx| {
            let now = Self::next_timestamp(tx)?;
            let order = Order {
                id: OrderId::new(),
                code: code.to_string(),
                status: OrderStatus::Pending,
                updated_at: now,
                synced: false,
            };

            tx.execute(
                "INSERT INTO orders (id, code, status, updated_at, synced) VALUES (?1, ?2, ?3, ?4, 0)",
                params![order.id.as_str(), order.code, order.status, order.updated_at],
            )?;

            let operation = SyncOperation::CreateOrder(CreateOrderPayload {
                order_id: order.id.clone(),
                code: order.code.clone(),
                at: now,
            });
            SyncQueueRepository::new(tx).enqueue(&operation, now)?;

            Ok(order)
        })
    }

    fn update_status(&self, id: &OrderId, next_status: OrderStatus) -> Result<Order> {
        with_transaction(self.conn, "update_order_status", |tx| {
            let now = Self::next_timestamp(tx)?;

            let order = tx
                .query_row(
                    "UPDATE orders SET status = ?1, updated_at = ?2, synced = 0
                     WHERE id = ?3
                     RETURNING id, code, status, updated_at, synced",
                    params![next_status, now, id.as_str()],
                    Self::parse_order,
                )
                .optional()?
                .ok_or_else(|| Error::NotFound(id.to_string()))?;

            let operation = SyncOperation::UpdateOrderStatus(UpdateOrderStatusPayload {
                order_id: order.id.clone(),
                next_status,
                at: now,
            });
            SyncQueueRepository::new(tx).enqueue(&operation, now)?;

            Ok(order)
        })
    }

    fn delete(&self, id: &OrderId) -> Result<()> {
        self.delete_many(std::slice::from_ref(id)).map(|_| ())
    }

    fn delete_many(&self, ids: &[OrderId]) -> Result<usize> {
        let mut seen = HashSet::new();
        let ids: Vec<&OrderId> = ids.iter().filter(|id| seen.insert(*id)).collect();
        if ids.is_empty() {
            return Ok(0);
        }

        with_transaction(self.conn, "delete_orders", |tx| {
            let now = Self::next_timestamp(tx)?;

            for id in &ids {
                Self::remove_order(tx, id)?;
            }

            let queue = SyncQueueRepository::new(tx);
            for id in &ids {
                let operation = SyncOperation::DeleteOrder(DeleteOrderPayload {
                    order_id: (*id).clone(),
                    at: now,
                });
                queue.enqueue(&operation, now)?;
            }

            Ok(ids.len())
        })
    }

    fn get(&self, id: &OrderId) -> Result<Option<OrderDetail>> {
        let order = self
            .conn
            .query_row(
                "SELECT id, code, status, updated_at, synced FROM orders WHERE id = ?1",
                params![id.as_str()],
                Self::parse_order,
            )
            .optional()?;

        match order {
            Some(order) => {
                let items = self.items_for(&order.id)?;
                Ok(Some(OrderDetail { order, items }))
            }
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<Order>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, status, updated_at, synced
             FROM orders
             ORDER BY updated_at DESC, rowid DESC",
        )?;

        let orders = stmt
            .query_map([], Self::parse_order)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(orders)
    }

    fn add_item(&self, order_id: &OrderId, name: &str, qty: i64) -> Result<OrderItem> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("item name cannot be empty".into()));
        }
        if qty <= 0 {
            return Err(Error::InvalidInput(format!(
                "item quantity must be positive, got {qty}"
            )));
        }

        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE id = ?1)",
            params![order_id.as_str()],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(Error::NotFound(order_id.to_string()));
        }

        Self::insert_item(self.conn, order_id, name, qty)
    }

    fn seed_if_empty(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(false);
        }

        with_transaction(self.conn, "seed_orders", |tx| {
            let now = Self::next_timestamp(tx)?;
            let seeds: [(&str, OrderStatus, &[(&str, i64)]); 2] = [
                (
                    "ORD-1024",
                    OrderStatus::Pending,
                    &[("Coca-Cola 600ml", 12), ("Sabritas 45g", 20)],
                ),
                ("ORD-1025", OrderStatus::Picking, &[("Agua 1L", 10)]),
            ];

            for (code, status, items) in seeds {
                let id = OrderId::new();
                // Seed data mirrors the remote, so it starts synced and is not queued
                tx.execute(
                    "INSERT INTO orders (id, code, status, updated_at, synced) VALUES (?1, ?2, ?3, ?4, 1)",
                    params![id.as_str(), code, status, now],
                )?;
                for (name, qty) in items {
                    Self::insert_item(tx, &id, name, *qty)?;
                }
            }

            tracing::info!("Seeded store with demo orders");
            Ok(true)
        })
    }
}

impl ToSql for OrderStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for OrderStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::SyncOperationKind;
    use pretty_assertions::assert_eq;

    fn queue_rows(conn: &Connection) -> Vec<(String, bool)> {
        let mut stmt = conn
            .prepare("SELECT type, synced FROM sync_queue ORDER BY created_at, rowid")
            .unwrap();
        stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0))
        })
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
    }

    fn item_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM order_items", [], |row| row.get(0))
            .unwrap()
    }

    /// Every order has `synced = 0` iff at least one unsynced queue entry references it
    fn assert_consistent(conn: &Connection) {
        let repo = SqliteOrderRepository::new(conn);
        let queue = SyncQueueRepository::new(conn);
        for order in repo.list().unwrap() {
            let pending = queue.pending_count_for(&order.id).unwrap();
            assert_eq!(!order.synced, pending > 0, "order {} inconsistent", order.code);
        }
    }

    #[test]
    fn test_create_enqueues_create_order() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection_blocking();
        let repo = SqliteOrderRepository::new(&conn);

        let order = repo.create(&NewOrder::new("  ORD-2001 ")).unwrap();
        assert_eq!(order.code, "ORD-2001");
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.synced);

        let fetched = repo.get(&order.id).unwrap().unwrap();
        assert_eq!(fetched.order, order);
        assert!(fetched.items.is_empty());

        assert_eq!(queue_rows(&conn), vec![("CREATE_ORDER".to_string(), false)]);

        let pending = SyncQueueRepository::new(&conn).pending().unwrap();
        let item = pending[0].decode().unwrap();
        assert_eq!(item.operation.order_id(), &order.id);
        assert_eq!(item.operation.at(), order.updated_at);
        assert_consistent(&conn);
    }

    #[test]
    fn test_create_rejects_empty_code_without_writing() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection_blocking();
        let repo = SqliteOrderRepository::new(&conn);

        assert!(matches!(
            repo.create(&NewOrder::new("   ")),
            Err(Error::InvalidInput(_))
        ));
        assert!(repo.list().unwrap().is_empty());
        assert!(queue_rows(&conn).is_empty());
    }

    #[test]
    fn test_update_status_twice_enqueues_twice() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection_blocking();
        let repo = SqliteOrderRepository::new(&conn);

        let order = repo.create(&NewOrder::new("ORD-1")).unwrap();
        let first = repo.update_status(&order.id, OrderStatus::Picking).unwrap();
        let second = repo.update_status(&order.id, OrderStatus::Picking).unwrap();

        assert_eq!(second.status, OrderStatus::Picking);
        assert!(!second.synced);
        assert!(first.updated_at >= order.updated_at);
        assert!(second.updated_at >= first.updated_at);

        let kinds: Vec<String> = queue_rows(&conn).into_iter().map(|(kind, _)| kind).collect();
        assert_eq!(
            kinds,
            vec![
                SyncOperationKind::CreateOrder.to_string(),
                SyncOperationKind::UpdateOrderStatus.to_string(),
                SyncOperationKind::UpdateOrderStatus.to_string(),
            ]
        );
        assert_consistent(&conn);
    }

    #[test]
    fn test_update_status_unknown_order_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection_blocking();
        let repo = SqliteOrderRepository::new(&conn);

        let missing = OrderId::from("missing".to_string());
        assert!(matches!(
            repo.update_status(&missing, OrderStatus::Delivered),
            Err(Error::NotFound(_))
        ));
        assert!(queue_rows(&conn).is_empty());
    }

    #[test]
    fn test_delete_removes_items_and_enqueues() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection_blocking();
        let repo = SqliteOrderRepository::new(&conn);

        let order = repo.create(&NewOrder::new("ORD-1")).unwrap();
        repo.add_item(&order.id, "Agua 1L", 3).unwrap();
        repo.delete(&order.id).unwrap();

        assert!(repo.get(&order.id).unwrap().is_none());
        assert_eq!(item_count(&conn), 0);
        let kinds: Vec<String> = queue_rows(&conn).into_iter().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, vec!["CREATE_ORDER", "DELETE_ORDER"]);
    }

    #[test]
    fn test_delete_many_is_atomic() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection_blocking();
        let repo = SqliteOrderRepository::new(&conn);

        let a = repo.create(&NewOrder::new("A")).unwrap();
        let b = repo.create(&NewOrder::new("B")).unwrap();
        repo.add_item(&a.id, "Box", 1).unwrap();

        let missing = OrderId::from("missing".to_string());
        let result = repo.delete_many(&[a.id.clone(), missing, b.id.clone()]);
        assert!(matches!(result, Err(Error::NotFound(_))));

        // Nothing removed, nothing queued
        assert_eq!(repo.list().unwrap().len(), 2);
        assert_eq!(item_count(&conn), 1);
        assert_eq!(queue_rows(&conn).len(), 2);
    }

    #[test]
    fn test_delete_many_removes_all_and_queues_one_entry_each() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection_blocking();
        let repo = SqliteOrderRepository::new(&conn);

        let ids: Vec<OrderId> = ["A", "B", "C"]
            .iter()
            .map(|code| repo.create(&NewOrder::new(*code)).unwrap().id)
            .collect();
        for id in &ids {
            repo.add_item(id, "Item", 2).unwrap();
        }

        let mut with_duplicate = ids.clone();
        with_duplicate.push(ids[0].clone());
        assert_eq!(repo.delete_many(&with_duplicate).unwrap(), 3);

        assert!(repo.list().unwrap().is_empty());
        assert_eq!(item_count(&conn), 0);
        let deletes = queue_rows(&conn)
            .into_iter()
            .filter(|(kind, synced)| kind == "DELETE_ORDER" && !synced)
            .count();
        assert_eq!(deletes, 3);
        assert_eq!(repo.delete_many(&[]).unwrap(), 0);
    }

    #[test]
    fn test_list_orders_most_recent_first() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection_blocking();
        let repo = SqliteOrderRepository::new(&conn);

        let pause = || std::thread::sleep(std::time::Duration::from_millis(3));
        let first = repo.create(&NewOrder::new("FIRST")).unwrap();
        pause();
        repo.create(&NewOrder::new("SECOND")).unwrap();
        pause();
        repo.update_status(&first.id, OrderStatus::Delivered).unwrap();

        let codes: Vec<String> = repo.list().unwrap().into_iter().map(|o| o.code).collect();
        assert_eq!(codes, vec!["FIRST", "SECOND"]);
    }

    #[test]
    fn test_add_item_validates_input() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection_blocking();
        let repo = SqliteOrderRepository::new(&conn);

        let order = repo.create(&NewOrder::new("ORD-1")).unwrap();
        assert!(repo.add_item(&order.id, " ", 1).is_err());
        assert!(repo.add_item(&order.id, "Box", 0).is_err());
        assert!(matches!(
            repo.add_item(&OrderId::from("nope".to_string()), "Box", 1),
            Err(Error::NotFound(_))
        ));

        let item = repo.add_item(&order.id, "Box", 4).unwrap();
        let detail = repo.get(&order.id).unwrap().unwrap();
        assert_eq!(detail.items, vec![item]);
        // Items are local-only
        assert_eq!(queue_rows(&conn).len(), 1);
    }

    #[test]
    fn test_seed_if_empty_only_once() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection_blocking();
        let repo = SqliteOrderRepository::new(&conn);

        assert!(repo.seed_if_empty().unwrap());
        assert!(!repo.seed_if_empty().unwrap());

        let orders = repo.list().unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|order| order.synced));
        assert_eq!(item_count(&conn), 3);
        assert!(queue_rows(&conn).is_empty());
        assert_consistent(&conn);
    }
}
