//! Bulk candidate-row import.
//!
//! Loads a JSON document of normalized entity and relationship rows (the
//! hand-off format of the offline data preparation step) into the
//! relational store inside one transaction, then runs a full sync so the
//! graph picks the rows up immediately.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bomgraph_db::queries::composition::{self, CompositionRecord};
use bomgraph_db::queries::parts::{self, PartRecord};
use bomgraph_db::queries::processes::{self, ProcessRecord};
use bomgraph_db::queries::structure::{self, StructuralLinkRecord};
use bomgraph_db::{DbPool, DbResult, migrations};
use bomgraph_graph::{GraphConfig, SyncDriver};
use clap::Args;
use colored::Colorize;
use serde::Deserialize;

use super::sync::print_report;

/// Candidate rows for a one-time bulk load.
#[derive(Debug, Default, Deserialize)]
pub struct ImportDocument {
    #[serde(default)]
    pub processes: Vec<ProcessRecord>,
    #[serde(default)]
    pub parts: Vec<PartRecord>,
    #[serde(default)]
    pub structural_links: Vec<StructuralLinkRecord>,
    #[serde(default)]
    pub composition: Vec<CompositionRecord>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file with candidate rows
    pub file: PathBuf,

    /// Load the relational rows without syncing the graph
    #[arg(long)]
    pub skip_sync: bool,
}

pub async fn execute(args: ImportArgs, db_path: &Path, dataset: &str) -> Result<()> {
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let document: ImportDocument = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let pool = DbPool::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    migrations::run_migrations(&pool).context("Failed to run migrations")?;

    pool.with_conn(|conn| {
        conn.execute_batch("BEGIN")?;
        Ok(())
    })?;
    match load_rows(&pool, &document) {
        Ok(()) => {
            pool.with_conn(|conn| {
                conn.execute_batch("COMMIT")?;
                Ok(())
            })?;
        }
        Err(err) => {
            let _ = pool.with_conn(|conn| {
                conn.execute_batch("ROLLBACK")?;
                Ok(())
            });
            return Err(err).context("Import failed; no rows were loaded");
        }
    }

    println!(
        "{} {} processes, {} parts, {} links, {} composition lines",
        "Loaded:".green(),
        document.processes.len(),
        document.parts.len(),
        document.structural_links.len(),
        document.composition.len(),
    );

    if args.skip_sync {
        println!("{}", "Graph sync skipped; run 'bomgraph sync' to project.".dimmed());
        return Ok(());
    }

    let driver = SyncDriver::connect(&GraphConfig::from_env(), dataset)
        .await
        .context("Failed to connect to the graph store")?;
    driver.init_schema().await?;
    let report = driver.full_resync(&pool).await?;
    print_report(&report);

    Ok(())
}

fn load_rows(pool: &DbPool, document: &ImportDocument) -> DbResult<()> {
    for record in &document.processes {
        processes::upsert_process(pool, record)?;
    }
    for record in &document.parts {
        parts::upsert_part(pool, record)?;
    }
    for record in &document.structural_links {
        structure::upsert_link(pool, record)?;
    }
    for record in &document.composition {
        composition::upsert_line(pool, record)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_with_defaults() {
        let raw = r#"{
            "processes": [{"id": 1, "name": "Assemble", "category": "MainProcess"}],
            "parts": [{"id": 10, "name": "Gripper"}],
            "composition": [{"process_id": 1, "part_id": 10}]
        }"#;

        let document: ImportDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(document.processes.len(), 1);
        assert_eq!(document.parts.len(), 1);
        assert!(document.structural_links.is_empty());
        assert_eq!(document.composition[0].quantity, 1);
        assert_eq!(document.composition[0].role, None);
    }

    #[test]
    fn test_load_rows_round_trip() {
        let pool = DbPool::in_memory().unwrap();
        migrations::run_migrations(&pool).unwrap();

        let raw = r#"{
            "processes": [
                {"id": 1, "name": "Assemble", "category": "MainProcess"},
                {"id": 2, "name": "Weld", "category": "SubProcess"}
            ],
            "parts": [{"id": 10, "name": "Gripper", "manufacturer": "Acme"}],
            "structural_links": [{"parent_process_id": 1, "child_process_id": 2, "quantity": 2}],
            "composition": [{"process_id": 2, "part_id": 10, "quantity": 4, "role": "main"}]
        }"#;
        let document: ImportDocument = serde_json::from_str(raw).unwrap();
        load_rows(&pool, &document).unwrap();

        assert_eq!(processes::count_processes(&pool).unwrap(), 2);
        assert_eq!(parts::count_parts(&pool).unwrap(), 1);
        assert_eq!(structure::count_links(&pool).unwrap(), 1);
        let bom = composition::effective_rows(&pool, 2).unwrap();
        assert_eq!(bom.len(), 1);
        assert_eq!(bom[0].quantity, 4);
    }
}
