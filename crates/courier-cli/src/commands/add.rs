use courier_core::CourierService;

use crate::error::CliError;

pub async fn run_add(code: &str, service: &CourierService) -> Result<(), CliError> {
    let order = service.create_order(code).await?;
    println!("{}", order.id);
    Ok(())
}
