//! Queued mutations and their payloads

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{OrderId, OrderStatus};
use crate::error::{Error, Result};

/// Discriminant stored in the `sync_queue.type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncOperationKind {
    CreateOrder,
    UpdateOrderStatus,
    DeleteOrder,
}

impl SyncOperationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateOrder => "CREATE_ORDER",
            Self::UpdateOrderStatus => "UPDATE_ORDER_STATUS",
            Self::DeleteOrder => "DELETE_ORDER",
        }
    }

    /// Whether a confirmed operation of this kind marks the order row synced.
    /// Deletes have no row left to mark.
    pub const fn touches_order_row(self) -> bool {
        !matches!(self, Self::DeleteOrder)
    }
}

impl fmt::Display for SyncOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncOperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CREATE_ORDER" => Ok(Self::CreateOrder),
            "UPDATE_ORDER_STATUS" => Ok(Self::UpdateOrderStatus),
            "DELETE_ORDER" => Ok(Self::DeleteOrder),
            other => Err(Error::InvalidInput(format!(
                "unknown sync operation type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    pub order_id: OrderId,
    pub code: String,
    pub at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusPayload {
    pub order_id: OrderId,
    pub next_status: OrderStatus,
    pub at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOrderPayload {
    pub order_id: OrderId,
    pub at: i64,
}

/// A mutation waiting to be replayed against the remote.
///
/// Serialized as `{"type": "CREATE_ORDER", "payload": {...}}` on the wire; in
/// the store the tag and payload live in separate columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncOperation {
    CreateOrder(CreateOrderPayload),
    UpdateOrderStatus(UpdateOrderStatusPayload),
    DeleteOrder(DeleteOrderPayload),
}

impl SyncOperation {
    pub const fn kind(&self) -> SyncOperationKind {
        match self {
            Self::CreateOrder(_) => SyncOperationKind::CreateOrder,
            Self::UpdateOrderStatus(_) => SyncOperationKind::UpdateOrderStatus,
            Self::DeleteOrder(_) => SyncOperationKind::DeleteOrder,
        }
    }

    pub const fn order_id(&self) -> &OrderId {
        match self {
            Self::CreateOrder(p) => &p.order_id,
            Self::UpdateOrderStatus(p) => &p.order_id,
            Self::DeleteOrder(p) => &p.order_id,
        }
    }

    /// Timestamp of the local mutation this operation describes
    pub const fn at(&self) -> i64 {
        match self {
            Self::CreateOrder(p) => p.at,
            Self::UpdateOrderStatus(p) => p.at,
            Self::DeleteOrder(p) => p.at,
        }
    }

    /// Serialize only the payload, as stored in `sync_queue.payload`.
    pub fn payload_json(&self) -> Result<String> {
        let json = match self {
            Self::CreateOrder(p) => serde_json::to_string(p)?,
            Self::UpdateOrderStatus(p) => serde_json::to_string(p)?,
            Self::DeleteOrder(p) => serde_json::to_string(p)?,
        };
        Ok(json)
    }

    /// Rebuild an operation from its stored `type` and `payload` columns.
    pub fn from_columns(kind: &str, payload: &str) -> Result<Self> {
        let operation = match kind.parse::<SyncOperationKind>()? {
            SyncOperationKind::CreateOrder => Self::CreateOrder(serde_json::from_str(payload)?),
            SyncOperationKind::UpdateOrderStatus => {
                Self::UpdateOrderStatus(serde_json::from_str(payload)?)
            }
            SyncOperationKind::DeleteOrder => Self::DeleteOrder(serde_json::from_str(payload)?),
        };
        Ok(operation)
    }
}

/// A `sync_queue` row as stored, before its payload is decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredQueueItem {
    pub id: String,
    pub kind: String,
    pub payload: String,
    pub created_at: i64,
    pub synced: bool,
}

impl StoredQueueItem {
    pub fn decode(&self) -> Result<SyncQueueItem> {
        Ok(SyncQueueItem {
            id: self.id.clone(),
            operation: SyncOperation::from_columns(&self.kind, &self.payload)?,
            created_at: self.created_at,
            synced: self.synced,
        })
    }
}

/// A decoded queue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncQueueItem {
    pub id: String,
    pub operation: SyncOperation,
    pub created_at: i64,
    pub synced: bool,
}
