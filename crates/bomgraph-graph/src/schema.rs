//! Neo4j schema initialization (constraints and indexes).

use neo4rs::Query;
use tracing::info;

use crate::GraphClient;
use crate::error::GraphResult;

/// Cypher statements for schema initialization.
///
/// Node identity is (id, dataset), so the uniqueness constraints are
/// composite; the dataset indexes keep wipe/status scans cheap.
const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE CONSTRAINT process_identity IF NOT EXISTS FOR (p:Process) REQUIRE (p.id, p.dataset) IS UNIQUE",
    "CREATE CONSTRAINT part_identity IF NOT EXISTS FOR (m:Part) REQUIRE (m.id, m.dataset) IS UNIQUE",
    "CREATE INDEX process_dataset IF NOT EXISTS FOR (p:Process) ON (p.dataset)",
    "CREATE INDEX part_dataset IF NOT EXISTS FOR (m:Part) ON (m.dataset)",
];

/// Initialize the graph schema with constraints and indexes.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses.
pub async fn initialize_schema(client: &GraphClient) -> GraphResult<()> {
    info!("Initializing graph schema...");

    for statement in SCHEMA_STATEMENTS {
        client.execute(Query::new(statement.to_string())).await?;
    }

    info!("Graph schema initialized ({} statements)", SCHEMA_STATEMENTS.len());
    Ok(())
}
