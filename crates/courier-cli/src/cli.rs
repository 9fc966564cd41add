use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use courier_core::OrderStatus;

#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "Capture delivery orders offline and sync them when connectivity returns")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local order store
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Treat the device as offline: changes are queued and sync is skipped
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new order in PENDING
    #[command(alias = "new")]
    Add {
        /// Order code, e.g. ORD-1026
        code: String,
    },
    /// List orders, most recently touched first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show an order with its items
    Show {
        /// Order ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change an order's status
    SetStatus {
        /// Order ID or unique ID prefix
        id: String,
        /// New status
        #[arg(value_enum)]
        status: StatusArg,
    },
    /// Delete one or more orders atomically
    Delete {
        /// Order IDs or unique ID prefixes
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Replay queued changes against the remote now
    Sync,
    /// Inspect the sync queue
    Queue {
        /// Only show entries not yet synced
        #[arg(long)]
        pending: bool,
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Insert demo orders into an empty store
    Seed,
    /// Keep syncing automatically whenever connectivity returns (Ctrl-C to stop)
    Watch {
        /// Seconds between connectivity checks
        #[arg(long, default_value = "5", value_name = "SECS")]
        interval: u64,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Picking,
    Delivered,
}

impl From<StatusArg> for OrderStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Pending => Self::Pending,
            StatusArg::Picking => Self::Picking,
            StatusArg::Delivered => Self::Delivered,
        }
    }
}
