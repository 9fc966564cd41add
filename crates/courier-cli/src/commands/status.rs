use courier_core::{CourierService, OrderStatus};

use crate::commands::common::resolve_order;
use crate::error::CliError;

pub async fn run_set_status(
    id: &str,
    status: OrderStatus,
    service: &CourierService,
) -> Result<(), CliError> {
    let detail = resolve_order(id, service).await?;
    let order = service.update_order_status(&detail.order.id, status).await?;
    println!("{}  {} -> {}", order.code, detail.order.status, order.status);
    Ok(())
}
