//! Store status display.

use std::path::Path;

use anyhow::{Context, Result};
use bomgraph_db::{DbPool, migrations, queries};
use bomgraph_graph::{GraphConfig, SyncDriver};
use colored::Colorize;

pub async fn execute(db_path: &Path, dataset: &str) -> Result<()> {
    let pool = DbPool::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    migrations::run_migrations(&pool).context("Failed to run migrations")?;

    println!("{}", "Relational store".bold());
    println!("  Processes: {}", queries::processes::count_processes(&pool)?);
    println!("  Parts: {}", queries::parts::count_parts(&pool)?);
    println!("  Structural links: {}", queries::structure::count_links(&pool)?);
    println!("  Composition lines: {}", queries::composition::count_lines(&pool)?);
    match queries::sync_state::last_sync_time(&pool)? {
        Some(time) => println!("  Last sync: {time}"),
        None => println!("  Last sync: {}", "never".dimmed()),
    }

    let driver = SyncDriver::connect(&GraphConfig::from_env(), dataset)
        .await
        .context("Failed to connect to the graph store")?;
    let counts = driver.status().await?;

    println!("\n{}", format!("Graph projection (dataset '{dataset}')").bold());
    println!("  Nodes: {}", counts.nodes);
    println!("  Relationships: {}", counts.relationships);

    Ok(())
}
