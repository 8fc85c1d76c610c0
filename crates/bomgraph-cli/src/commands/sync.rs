//! Full projection sync.

use std::path::Path;

use anyhow::{Context, Result};
use bomgraph_db::{DbPool, migrations};
use bomgraph_graph::{GraphConfig, SyncDriver, SyncReport};
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct SyncArgs {
    /// Wipe the dataset from the graph before re-deriving it
    #[arg(long)]
    pub rebuild: bool,
}

pub async fn execute(args: SyncArgs, db_path: &Path, dataset: &str) -> Result<()> {
    let pool = DbPool::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    migrations::run_migrations(&pool).context("Failed to run migrations")?;

    let driver = SyncDriver::connect(&GraphConfig::from_env(), dataset)
        .await
        .context("Failed to connect to the graph store")?;
    driver.init_schema().await?;

    println!("{}", "Syncing to graph projection...".bold());
    let report = if args.rebuild {
        driver.rebuild(&pool).await?
    } else {
        driver.full_resync(&pool).await?
    };

    print_report(&report);
    Ok(())
}

/// Render a sync report, with per-row failures listed individually.
pub fn print_report(report: &SyncReport) {
    println!("\n{}", "Sync complete:".green().bold());
    println!("  Nodes/edges upserted: {}", report.upserted);
    println!("  Stale edges removed: {}", report.removed);

    if !report.is_clean() {
        println!("{}", format!("  Failed rows: {}", report.failures.len()).yellow());
        for failure in &report.failures {
            println!("    {} {}: {}", "!".yellow(), failure.key, failure.error);
        }
    }
}
