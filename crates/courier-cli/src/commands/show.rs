use courier_core::CourierService;

use crate::commands::common::{format_timestamp, resolve_order, sync_label};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, service: &CourierService) -> Result<(), CliError> {
    let detail = resolve_order(id, service).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let order = &detail.order;
    println!("{}  {}", order.code, order.id);
    println!("status:  {}", order.status);
    println!("updated: {}", format_timestamp(order.updated_at));
    println!("sync:    {}", sync_label(order.synced));
    if detail.items.is_empty() {
        println!("items:   none");
    } else {
        println!("items:");
        for item in &detail.items {
            println!("  {:>4} x {}", item.qty, item.name);
        }
    }
    Ok(())
}
