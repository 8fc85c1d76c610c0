//! Decomposition edge upserts.
//!
//! A DECOMPOSES_INTO edge may only run from a main process to a sub-process
//! in the same dataset. The MATCH clauses encode that rule: if either
//! endpoint is absent or mis-labeled nothing is merged and the link fails
//! per-row, so a quantity is never set on a half-created edge.

use bomgraph_core::StructuralLinkRow;
use neo4rs::Query;
use tracing::debug;

use super::SyncReport;
use crate::GraphClient;
use crate::error::{GraphError, GraphResult};
use crate::ident::graph_id;

/// Upsert decomposition edges. An empty batch is a no-op.
pub async fn upsert_decomposition(
    client: &GraphClient,
    dataset: &str,
    links: &[StructuralLinkRow],
) -> GraphResult<SyncReport> {
    let mut report = SyncReport::default();

    for link in links {
        let query = Query::new(
            "MATCH (p:Process:MainProcess {id: $parent, dataset: $dataset})
             MATCH (c:Process:SubProcess {id: $child, dataset: $dataset})
             MERGE (p)-[d:DECOMPOSES_INTO]->(c)
             SET d.quantity = $quantity,
                 d.dataset = $dataset
             RETURN count(d) as applied"
                .to_string(),
        )
        .param("parent", graph_id(link.parent_id))
        .param("child", graph_id(link.child_id))
        .param("dataset", dataset)
        .param("quantity", link.quantity);

        // No row back means a MATCH found nothing: endpoint missing or
        // carrying the wrong sublabel.
        if client.query(query).await?.is_empty() {
            report.fail(
                format!("decomposition {} -> {}", link.parent_id, link.child_id),
                GraphError::MissingEndpoint(format!(
                    "main process {} or sub-process {}",
                    link.parent_id, link.child_id
                )),
            );
            continue;
        }

        report.upserted += 1;
        debug!(
            parent_id = link.parent_id,
            child_id = link.child_id,
            quantity = link.quantity,
            "Upserted decomposition edge"
        );
    }

    Ok(report)
}
