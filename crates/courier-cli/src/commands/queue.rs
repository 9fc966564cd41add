use courier_core::CourierService;

use crate::commands::common::{format_queue_lines, queue_item_to_list_item, QueueListItem};
use crate::error::CliError;

pub async fn run_queue(
    pending_only: bool,
    limit: usize,
    as_json: bool,
    service: &CourierService,
) -> Result<(), CliError> {
    let items = service.queue_entries(limit, pending_only).await?;

    if as_json {
        let json_items = items
            .iter()
            .map(queue_item_to_list_item)
            .collect::<Vec<QueueListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("Sync queue is empty.");
        return Ok(());
    }

    for line in format_queue_lines(&items) {
        println!("{line}");
    }
    Ok(())
}
