//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod import;
pub mod init;
pub mod status;
pub mod sync;

/// Relational-to-graph synchronization for manufacturing BOM data
#[derive(Parser)]
#[command(name = "bomgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true, env = "BOMGRAPH_DB", default_value = "bomgraph.db")]
    pub db: PathBuf,

    /// Dataset tag carried on every projected node and edge
    #[arg(long, global = true, env = "BOMGRAPH_DATASET", default_value = "factory")]
    pub dataset: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the relational schema and graph constraints
    Init,

    /// Bulk-load candidate rows from a JSON file, then run a full sync
    Import(import::ImportArgs),

    /// Re-derive the graph projection from relational state
    Sync(sync::SyncArgs),

    /// Show store counts and the last sync time
    Status,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let Cli { db, dataset, command } = self;

        match command {
            Commands::Init => init::execute(&db, &dataset).await,
            Commands::Import(args) => import::execute(args, &db, &dataset).await,
            Commands::Sync(args) => sync::execute(args, &db, &dataset).await,
            Commands::Status => status::execute(&db, &dataset).await,
        }
    }
}
