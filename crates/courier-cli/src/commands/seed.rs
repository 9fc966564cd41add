use courier_core::CourierService;

use crate::error::CliError;

pub async fn run_seed(service: &CourierService) -> Result<(), CliError> {
    if service.seed_if_empty().await? {
        println!("Seeded demo orders");
    } else {
        println!("Store already has orders; nothing seeded");
    }
    Ok(())
}
