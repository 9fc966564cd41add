use courier_core::CourierService;

use crate::commands::common::{format_order_lines, order_to_list_item, OrderListItem};
use crate::error::CliError;

pub async fn run_list(as_json: bool, service: &CourierService) -> Result<(), CliError> {
    let orders = service.list_orders().await?;

    if as_json {
        let json_items = orders
            .iter()
            .map(order_to_list_item)
            .collect::<Vec<OrderListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    for line in format_order_lines(&orders) {
        println!("{line}");
    }
    Ok(())
}
