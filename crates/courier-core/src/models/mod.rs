//! Data models for Courier

mod order;
mod sync_operation;

pub use order::{NewOrder, Order, OrderDetail, OrderId, OrderItem, OrderStatus};
pub use sync_operation::{
    CreateOrderPayload, DeleteOrderPayload, StoredQueueItem, SyncOperation, SyncOperationKind,
    SyncQueueItem, UpdateOrderStatusPayload,
};
