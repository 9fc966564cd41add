use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use courier_core::connectivity::NetworkState;
use courier_core::models::StoredQueueItem;
use courier_core::{CourierConfig, CourierService, Order, OrderDetail, OrderId};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct OrderListItem {
    pub id: String,
    pub code: String,
    pub status: String,
    pub updated_at: i64,
    pub relative_time: String,
    pub synced: bool,
}

#[derive(Debug, Serialize)]
pub struct QueueListItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub order_id: Option<String>,
    pub created_at: i64,
    pub created_at_iso: String,
    pub synced: bool,
    /// Raw payload, present only when it cannot be decoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undecodable_payload: Option<String>,
}

/// Layer defaults, the config file, `COURIER_*` variables and the
/// `--db-path` flag, in that order.
pub fn resolve_config(
    config_path: Option<&Path>,
    cli_db_path: Option<PathBuf>,
) -> Result<CourierConfig, CliError> {
    let config_path = config_path.map_or_else(default_config_path, Path::to_path_buf);
    let mut config = CourierConfig::load_from_path(&config_path)?.with_env_overrides()?;

    if let Some(db_path) = cli_db_path {
        config.db_path = Some(db_path);
    }
    if config.db_path.is_none() {
        config.db_path = Some(default_db_path());
    }
    Ok(config)
}

pub fn open_service(config: &CourierConfig, offline: bool) -> Result<CourierService, CliError> {
    let service = CourierService::open(config)?;
    if offline {
        service.connectivity().report(NetworkState::offline());
    }
    Ok(service)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("courier")
        .join("courier.db")
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("courier")
        .join("config.json")
}

pub fn normalize_order_identifier(id: &str) -> Result<String, CliError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CliError::EmptyOrderId);
    }
    Ok(id.to_string())
}

/// Resolve a full order ID or a unique ID prefix.
pub async fn resolve_order(query: &str, service: &CourierService) -> Result<OrderDetail, CliError> {
    let query = normalize_order_identifier(query)?;

    if let Ok(order_id) = query.parse::<OrderId>() {
        if let Some(detail) = service.get_order(&order_id).await? {
            return Ok(detail);
        }
    }

    let matching_ids = service
        .list_orders()
        .await?
        .into_iter()
        .filter(|order| order.id.as_str().starts_with(&query))
        .map(|order| order.id)
        .collect::<Vec<_>>();

    match matching_ids.as_slice() {
        [] => Err(CliError::OrderNotFound(query)),
        [order_id] => service
            .get_order(order_id)
            .await?
            .ok_or(CliError::OrderNotFound(query)),
        _ => {
            let options = matching_ids
                .iter()
                .take(3)
                .map(OrderId::to_string)
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousOrderId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// Resolve several IDs or prefixes, keeping the first occurrence of each order.
pub async fn resolve_order_ids(
    queries: &[String],
    service: &CourierService,
) -> Result<Vec<OrderId>, CliError> {
    let mut seen = HashSet::new();
    let mut order_ids = Vec::with_capacity(queries.len());
    for query in queries {
        let order_id = resolve_order(query, service).await?.order.id;
        if seen.insert(order_id.clone()) {
            order_ids.push(order_id);
        }
    }
    Ok(order_ids)
}

pub fn format_order_lines(orders: &[Order]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    orders
        .iter()
        .map(|order| {
            let relative_time = format_relative_time(order.updated_at, now_ms);
            format!(
                "{}  {:<12}  {:<9}  {:<8}  {relative_time}",
                order.id,
                order.code,
                order.status.as_str(),
                sync_label(order.synced)
            )
        })
        .collect()
}

pub fn order_to_list_item(order: &Order) -> OrderListItem {
    let now_ms = Utc::now().timestamp_millis();
    OrderListItem {
        id: order.id.to_string(),
        code: order.code.clone(),
        status: order.status.to_string(),
        updated_at: order.updated_at,
        relative_time: format_relative_time(order.updated_at, now_ms),
        synced: order.synced,
    }
}

pub fn format_queue_lines(items: &[StoredQueueItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let target = item.decode().map_or_else(
                |_| format!("undecodable payload={}", payload_excerpt(&item.payload, 40)),
                |decoded| format!("order={}", decoded.operation.order_id()),
            );
            format!(
                "{}  {:<19}  {target}  {}",
                format_timestamp(item.created_at),
                item.kind,
                sync_label(item.synced)
            )
        })
        .collect()
}

pub fn queue_item_to_list_item(item: &StoredQueueItem) -> QueueListItem {
    let decoded = item.decode().ok();
    QueueListItem {
        id: item.id.clone(),
        kind: item.kind.clone(),
        order_id: decoded
            .as_ref()
            .map(|decoded| decoded.operation.order_id().to_string()),
        created_at: item.created_at,
        created_at_iso: format_timestamp(item.created_at),
        synced: item.synced,
        undecodable_payload: decoded.is_none().then(|| item.payload.clone()),
    }
}

fn payload_excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub const fn sync_label(synced: bool) -> &'static str {
    if synced {
        "synced"
    } else {
        "pending"
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else {
        format!("{}d ago", diff / day)
    }
}
