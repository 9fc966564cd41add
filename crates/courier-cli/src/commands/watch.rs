use std::time::Duration;

use courier_core::CourierService;

use crate::error::CliError;

/// Run auto-sync until Ctrl-C.
///
/// Each tick refreshes reachability. While work is pending and the device is
/// online the current state is re-published, so a failed drain is retried
/// after the debounce window.
pub async fn run_watch(interval_secs: u64, service: &CourierService) -> Result<(), CliError> {
    let _syncing = service.subscribe_syncing(|syncing| {
        if syncing {
            println!("Syncing...");
        }
    });
    let auto_sync = service.start_auto_sync(|synced| {
        println!("Synced {synced} operation(s)");
    });

    let period = tick_period(interval_secs, service.debounce());
    println!("Watching connectivity every {period:?}; press Ctrl-C to stop");
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            _ = ticker.tick() => {
                let state = service.connectivity().refresh().await;
                if state.is_online() && service.pending_count().await? > 0 && !service.is_syncing() {
                    service.connectivity().report(state);
                }
            }
        }
    }

    auto_sync.stop();
    println!("Stopped");
    Ok(())
}

/// Time between connectivity checks.
///
/// Every re-published online state re-arms the debounce timer, so ticks must
/// be spaced wider than the debounce window or the timer never fires.
pub fn tick_period(interval_secs: u64, debounce: Duration) -> Duration {
    Duration::from_secs(interval_secs.max(1)).max(debounce.saturating_mul(2))
}
