//! Effective composition reconciliation.
//!
//! Makes the dataset-scoped USES_PART edges leaving one process match the
//! relational BOM exactly: read the current edges, diff against the desired
//! rows in plain Rust, delete the stale edges, then upsert every desired
//! row. Edge identity is (part id, role); the empty role is its own slot.
//!
//! Every read and write here is restricted to the caller's dataset, so two
//! datasets sharing one graph instance never prune each other's edges.

use std::collections::HashSet;

use bomgraph_core::{BomRow, normalize_role};
use neo4rs::Query;
use tracing::debug;

use super::SyncReport;
use crate::GraphClient;
use crate::error::{GraphError, GraphResult};
use crate::ident::graph_id;

/// Identity of a usage edge within one process and dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub part_id: String,
    pub role: String,
}

impl EdgeKey {
    fn from_bom_row(row: &BomRow) -> Self {
        Self {
            part_id: graph_id(row.part_id),
            role: normalize_role(Some(&row.role)),
        }
    }
}

/// A usage edge as currently present in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEdge {
    pub part_id: String,
    pub role: String,
    pub quantity: i64,
}

/// Outcome of comparing current graph state with desired relational state.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UsageDiff {
    /// Edges present in the graph whose (part, role) identity no longer
    /// appears relationally.
    pub stale: Vec<EdgeKey>,
    /// Every desired row; upserted unconditionally so quantity changes on
    /// surviving edges are refreshed.
    pub upserts: Vec<BomRow>,
}

/// Compare existing edges with desired rows by (part, role) identity.
pub fn diff_usage(existing: &[UsageEdge], desired: &[BomRow]) -> UsageDiff {
    let desired_rows: Vec<BomRow> = desired
        .iter()
        .map(|row| BomRow {
            part_id: row.part_id,
            quantity: row.quantity,
            role: normalize_role(Some(&row.role)),
        })
        .collect();

    let desired_keys: HashSet<EdgeKey> = desired_rows.iter().map(EdgeKey::from_bom_row).collect();

    let mut stale: Vec<EdgeKey> = existing
        .iter()
        .map(|edge| EdgeKey {
            part_id: edge.part_id.clone(),
            role: normalize_role(Some(&edge.role)),
        })
        .filter(|key| !desired_keys.contains(key))
        .collect();
    stale.sort();
    stale.dedup();

    UsageDiff {
        stale,
        upserts: desired_rows,
    }
}

/// Reconcile the usage edges of one process against its current BOM rows.
///
/// Postcondition on success: the dataset-scoped (part, role) pairs with an
/// outgoing USES_PART edge from this process equal exactly the pairs in
/// `rows`, each edge carrying its row's quantity. A row whose part node is
/// missing fails per-row without stopping the rest.
pub async fn reconcile(
    client: &GraphClient,
    dataset: &str,
    process_id: i64,
    rows: &[BomRow],
) -> GraphResult<SyncReport> {
    let existing = read_usage(client, dataset, process_id).await?;
    let diff = diff_usage(&existing, rows);

    let mut report = SyncReport::default();

    for key in &diff.stale {
        delete_edge(client, dataset, process_id, key).await?;
        report.removed += 1;
    }

    for row in &diff.upserts {
        if upsert_edge(client, dataset, process_id, row).await? {
            report.upserted += 1;
        } else {
            report.fail(
                format!("usage {} -> {}", process_id, row.part_id),
                GraphError::MissingEndpoint(format!(
                    "process {} or part {}",
                    process_id, row.part_id
                )),
            );
        }
    }

    debug!(
        process_id,
        existing = existing.len(),
        desired = diff.upserts.len(),
        removed = report.removed,
        failures = report.failures.len(),
        "Reconciled usage edges"
    );

    Ok(report)
}

/// Read the current dataset-scoped usage edges of one process.
async fn read_usage(
    client: &GraphClient,
    dataset: &str,
    process_id: i64,
) -> GraphResult<Vec<UsageEdge>> {
    let query = Query::new(
        "MATCH (p:Process {id: $id, dataset: $dataset})-[u:USES_PART]->(m:Part)
         WHERE coalesce(u.dataset, '') = $dataset
         RETURN m.id as part_id, coalesce(u.role, '') as role, coalesce(u.quantity, 0) as quantity"
            .to_string(),
    )
    .param("id", graph_id(process_id))
    .param("dataset", dataset);

    let mut edges = Vec::new();
    for row in client.query(query).await? {
        let part_id: String = row
            .get("part_id")
            .map_err(|e| GraphError::Decode(format!("field 'part_id': {e:?}")))?;
        let role: String = row
            .get("role")
            .map_err(|e| GraphError::Decode(format!("field 'role': {e:?}")))?;
        let quantity: i64 = row
            .get("quantity")
            .map_err(|e| GraphError::Decode(format!("field 'quantity': {e:?}")))?;
        edges.push(UsageEdge {
            part_id,
            role,
            quantity,
        });
    }
    Ok(edges)
}

/// Delete one stale usage edge, matched by (part, role) within the dataset.
async fn delete_edge(
    client: &GraphClient,
    dataset: &str,
    process_id: i64,
    key: &EdgeKey,
) -> GraphResult<()> {
    let query = Query::new(
        "MATCH (p:Process {id: $id, dataset: $dataset})-[u:USES_PART]->(m:Part {id: $part_id, dataset: $dataset})
         WHERE coalesce(u.dataset, '') = $dataset AND coalesce(u.role, '') = $role
         DELETE u"
            .to_string(),
    )
    .param("id", graph_id(process_id))
    .param("part_id", key.part_id.as_str())
    .param("role", key.role.as_str())
    .param("dataset", dataset);

    client.execute(query).await
}

/// Create or update one usage edge. Returns false when an endpoint node is
/// missing, in which case nothing was written.
async fn upsert_edge(
    client: &GraphClient,
    dataset: &str,
    process_id: i64,
    row: &BomRow,
) -> GraphResult<bool> {
    let query = Query::new(
        "MATCH (p:Process {id: $id, dataset: $dataset})
         MATCH (m:Part {id: $part_id, dataset: $dataset})
         MERGE (p)-[u:USES_PART {role: $role, dataset: $dataset}]->(m)
         SET u.quantity = $quantity
         RETURN count(u) as applied"
            .to_string(),
    )
    .param("id", graph_id(process_id))
    .param("part_id", graph_id(row.part_id))
    .param("role", row.role.as_str())
    .param("quantity", row.quantity)
    .param("dataset", dataset);

    Ok(!client.query(query).await?.is_empty())
}
