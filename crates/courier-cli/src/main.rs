//! Courier CLI - capture delivery orders offline and sync them later
//!
//! Every change is written locally together with a queued operation, so the
//! CLI works the same with or without a network.

mod cli;
mod commands;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::{open_service, resolve_config};
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::queue::run_queue;
use crate::commands::seed::run_seed;
use crate::commands::show::run_show;
use crate::commands::status::run_set_status;
use crate::commands::sync::run_sync;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "courier=info"
        .parse::<tracing_subscriber::filter::Directive>()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), cli.db_path)?;
    let service = open_service(&config, cli.offline)?;

    match cli.command {
        Commands::Add { code } => run_add(&code, &service).await?,
        Commands::List { json } => run_list(json, &service).await?,
        Commands::Show { id, json } => run_show(&id, json, &service).await?,
        Commands::SetStatus { id, status } => {
            run_set_status(&id, status.into(), &service).await?;
        }
        Commands::Delete { ids } => run_delete(&ids, &service).await?,
        Commands::Sync => run_sync(&service).await?,
        Commands::Queue {
            pending,
            limit,
            json,
        } => run_queue(pending, limit, json, &service).await?,
        Commands::Seed => run_seed(&service).await?,
        Commands::Watch { interval } => run_watch(interval, &service).await?,
    }

    Ok(())
}
