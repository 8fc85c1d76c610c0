//! Process and part node upserts.
//!
//! Nodes are MERGEd on (id, dataset), so re-running a batch with identical
//! input is a no-op on stored state. Process nodes additionally carry
//! exactly one of the two category sublabels; updating a process whose
//! category changed swaps the sublabel in the same statement.

use std::str::FromStr;

use bomgraph_core::{PartRow, ProcessCategory, ProcessRow};
use neo4rs::Query;
use tracing::debug;

use super::SyncReport;
use crate::GraphClient;
use crate::error::GraphResult;
use crate::ident::graph_id;

/// Upsert process nodes. An empty batch is a no-op; a row with a category
/// outside the closed set fails per-row before anything is written for it.
pub async fn upsert_processes(
    client: &GraphClient,
    dataset: &str,
    rows: &[ProcessRow],
) -> GraphResult<SyncReport> {
    let mut report = SyncReport::default();

    for row in rows {
        let category = match ProcessCategory::from_str(&row.category) {
            Ok(category) => category,
            Err(err) => {
                report.fail(format!("process {}", row.id), err.into());
                continue;
            }
        };

        // Labels cannot be parameterized in Cypher; both names come from the
        // closed category set.
        let cypher = format!(
            "MERGE (p:Process {{id: $id, dataset: $dataset}})
             SET p.name = $name,
                 p.category = $category
             SET p:{set_label}
             REMOVE p:{clear_label}",
            set_label = category.sublabel(),
            clear_label = category.other_sublabel(),
        );
        let query = Query::new(cypher)
            .param("id", graph_id(row.id))
            .param("dataset", dataset)
            .param("name", row.name.as_str())
            .param("category", category.as_str());

        client.execute(query).await?;
        report.upserted += 1;

        debug!(process_id = row.id, category = %category, "Upserted process node");
    }

    Ok(report)
}

/// Upsert part nodes. No sublabeling.
pub async fn upsert_parts(
    client: &GraphClient,
    dataset: &str,
    rows: &[PartRow],
) -> GraphResult<SyncReport> {
    let mut report = SyncReport::default();

    for row in rows {
        let query = Query::new(
            "MERGE (m:Part {id: $id, dataset: $dataset})
             SET m.name = $name,
                 m.part_type = $part_type,
                 m.manufacturer = $manufacturer"
                .to_string(),
        )
        .param("id", graph_id(row.id))
        .param("dataset", dataset)
        .param("name", row.name.as_str())
        .param("part_type", row.part_type.as_str())
        .param("manufacturer", row.manufacturer.as_str());

        client.execute(query).await?;
        report.upserted += 1;

        debug!(part_id = row.id, name = %row.name, "Upserted part node");
    }

    Ok(report)
}
