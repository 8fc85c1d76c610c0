//! Store initialization.

use std::path::Path;

use anyhow::{Context, Result};
use bomgraph_db::{DbPool, migrations};
use bomgraph_graph::{GraphConfig, SyncDriver};
use colored::Colorize;

pub async fn execute(db_path: &Path, dataset: &str) -> Result<()> {
    let pool = DbPool::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    migrations::run_migrations(&pool).context("Failed to run migrations")?;
    println!("{} {}", "Relational schema ready:".green(), db_path.display());

    let driver = SyncDriver::connect(&GraphConfig::from_env(), dataset)
        .await
        .context("Failed to connect to the graph store")?;
    driver.init_schema().await?;
    println!("{} dataset '{}'", "Graph schema ready:".green(), driver.dataset());

    Ok(())
}
