use courier_core::CourierService;

use crate::error::CliError;

pub async fn run_sync(service: &CourierService) -> Result<(), CliError> {
    if !service.is_online().await {
        let pending = service.pending_count().await?;
        println!("Offline; {pending} operation(s) remain queued");
        return Ok(());
    }

    let synced = service.process_sync_queue().await;
    let pending = service.pending_count().await?;
    if pending == 0 {
        println!("Sync completed: {synced} operation(s) synced");
    } else {
        println!("Synced {synced} operation(s); {pending} still pending");
    }
    Ok(())
}
