use courier_core::CourierService;

use crate::commands::common::resolve_order_ids;
use crate::error::CliError;

pub async fn run_delete(ids: &[String], service: &CourierService) -> Result<(), CliError> {
    let order_ids = resolve_order_ids(ids, service).await?;

    service.delete_orders(&order_ids).await?;
    for order_id in &order_ids {
        println!("{order_id}");
    }
    Ok(())
}
