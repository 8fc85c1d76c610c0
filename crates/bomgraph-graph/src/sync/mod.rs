//! Relational to graph synchronization pipeline.
//!
//! The [`SyncDriver`] translates relational mutation batches into node and
//! edge upserts and per-process reconciliation. The graph never becomes a
//! second source of truth: every operation is derivable from current
//! relational state and safe to retry in full, and a failed batch leaves a
//! projection lag that the next sync (or a full resync) repairs.

pub mod bom_sync;
pub mod node_sync;
pub mod structure_sync;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use bomgraph_core::{BomRow, CompositionRow, PartRow, ProcessRow, StructuralLinkRow};
use bomgraph_db::{DbPool, queries};
use neo4rs::Query;
use tracing::info;

use crate::client::{GraphClient, GraphConfig, GraphCounts};
use crate::error::{GraphError, GraphResult};
use crate::schema;

/// One row of a batch that could not be applied.
#[derive(Debug)]
pub struct RowFailure {
    /// Which row, e.g. `process 17` or `usage 3 -> 42`.
    pub key: String,
    pub error: GraphError,
}

/// Result of a sync batch. Failed rows never stop independent rows, so a
/// batch reports per-row outcomes instead of a single boolean.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Nodes or edges created or refreshed.
    pub upserted: usize,
    /// Stale edges deleted by reconciliation.
    pub removed: usize,
    pub failures: Vec<RowFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn fail(&mut self, key: impl Into<String>, error: GraphError) {
        self.failures.push(RowFailure {
            key: key.into(),
            error,
        });
    }

    fn merge(&mut self, other: SyncReport) {
        self.upserted += other.upserted;
        self.removed += other.removed;
        self.failures.extend(other.failures);
    }
}

/// Group composition rows by owning process, preserving a stable id order.
///
/// Reconciliation must run once per process with that process's complete
/// row set; feeding the same process twice in one batch would make the
/// second read observe the first write's partial state.
pub fn group_by_process(rows: &[CompositionRow]) -> BTreeMap<i64, Vec<BomRow>> {
    let mut grouped: BTreeMap<i64, Vec<BomRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.process_id).or_default().push(row.bom_row());
    }
    grouped
}

/// Per-process serialization for reconciliation.
///
/// Two concurrent reconciliations of the same process would each read the
/// same "current" edge set and compute diffs against it, double-deleting or
/// resurrecting edges. Different processes have no shared edges and run
/// concurrently.
#[derive(Default)]
struct KeyLocks {
    inner: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
    fn for_key(&self, key: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(key)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// Owns the graph connection and drives all projection writes.
///
/// Constructed with explicit configuration and a dataset name; the
/// underlying connection is never handed out.
pub struct SyncDriver {
    client: GraphClient,
    dataset: String,
    locks: KeyLocks,
}

impl SyncDriver {
    /// Connect to the graph store. Fails fast when it is unreachable.
    pub async fn connect(config: &GraphConfig, dataset: impl Into<String>) -> GraphResult<Self> {
        let client = GraphClient::connect(config).await?;
        Ok(Self {
            client,
            dataset: dataset.into(),
            locks: KeyLocks::default(),
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Create constraints and indexes. Safe to re-run.
    pub async fn init_schema(&self) -> GraphResult<()> {
        schema::initialize_schema(&self.client).await
    }

    /// Project created or updated process rows.
    pub async fn processes_changed(&self, rows: &[ProcessRow]) -> GraphResult<SyncReport> {
        node_sync::upsert_processes(&self.client, &self.dataset, rows).await
    }

    /// Project created or updated part rows.
    pub async fn parts_changed(&self, rows: &[PartRow]) -> GraphResult<SyncReport> {
        node_sync::upsert_parts(&self.client, &self.dataset, rows).await
    }

    /// Project upserted structural links.
    pub async fn structure_changed(&self, links: &[StructuralLinkRow]) -> GraphResult<SyncReport> {
        structure_sync::upsert_decomposition(&self.client, &self.dataset, links).await
    }

    /// Project a composition mutation batch.
    ///
    /// `rows` must be the complete current composition of every process it
    /// touches; rows are grouped by process id and each process is
    /// reconciled exactly once.
    pub async fn composition_changed(&self, rows: &[CompositionRow]) -> GraphResult<SyncReport> {
        let mut total = SyncReport::default();
        for (process_id, bom_rows) in group_by_process(rows) {
            let report = self.reconcile_process(process_id, &bom_rows).await?;
            total.merge(report);
        }
        Ok(total)
    }

    /// Re-read the current composition of the given processes from the
    /// relational store and reconcile each. The natural call after a
    /// composition write commits, including deletes: a process whose rows
    /// are all gone reconciles against the empty set.
    pub async fn refresh_composition(
        &self,
        db: &DbPool,
        process_ids: &[i64],
    ) -> GraphResult<SyncReport> {
        let mut total = SyncReport::default();
        for &process_id in process_ids {
            let rows = queries::composition::effective_rows(db, process_id)?;
            let report = self.reconcile_process(process_id, &rows).await?;
            total.merge(report);
        }
        Ok(total)
    }

    /// Reconcile one process's usage edges, serialized per process id.
    pub async fn reconcile_process(
        &self,
        process_id: i64,
        rows: &[BomRow],
    ) -> GraphResult<SyncReport> {
        let lock = self.locks.for_key(process_id);
        let _guard = lock.lock().await;
        bom_sync::reconcile(&self.client, &self.dataset, process_id, rows).await
    }

    /// Re-derive the whole dataset projection from relational state.
    ///
    /// Processes and parts first so edge upserts find their endpoints, then
    /// decomposition edges, then a reconciliation pass over every live
    /// process so stale usage edges are pruned even where no rows remain.
    pub async fn full_resync(&self, db: &DbPool) -> GraphResult<SyncReport> {
        info!(dataset = %self.dataset, "Starting full graph sync");

        let mut total = SyncReport::default();

        let processes = queries::processes::sync_rows(db)?;
        let report = self.processes_changed(&processes).await?;
        info!(nodes = report.upserted, failures = report.failures.len(), "Processes synced");
        total.merge(report);

        let parts = queries::parts::sync_rows(db)?;
        let report = self.parts_changed(&parts).await?;
        info!(nodes = report.upserted, failures = report.failures.len(), "Parts synced");
        total.merge(report);

        let links = queries::structure::sync_rows(db)?;
        let report = self.structure_changed(&links).await?;
        info!(edges = report.upserted, failures = report.failures.len(), "Decomposition synced");
        total.merge(report);

        let process_ids = queries::processes::live_ids(db)?;
        let mut usage = SyncReport::default();
        for &process_id in &process_ids {
            let rows = queries::composition::effective_rows(db, process_id)?;
            let report = self.reconcile_process(process_id, &rows).await?;
            usage.merge(report);
        }
        info!(
            edges = usage.upserted,
            removed = usage.removed,
            failures = usage.failures.len(),
            "Usage edges reconciled"
        );
        total.merge(usage);

        queries::sync_state::mark_synced(db, "process", &process_ids)?;
        let part_ids: Vec<i64> = parts.iter().map(|p| p.id).collect();
        queries::sync_state::mark_synced(db, "part", &part_ids)?;

        info!(
            upserted = total.upserted,
            removed = total.removed,
            failures = total.failures.len(),
            "Full sync complete"
        );

        Ok(total)
    }

    /// Wipe this dataset from the graph and re-derive it from scratch. The
    /// repair path for any drift the incremental path cannot heal, such as
    /// nodes left behind by relational deletes.
    pub async fn rebuild(&self, db: &DbPool) -> GraphResult<SyncReport> {
        info!(dataset = %self.dataset, "Wiping dataset before rebuild");

        let query = Query::new("MATCH (n {dataset: $dataset}) DETACH DELETE n".to_string())
            .param("dataset", self.dataset.as_str());
        self.client.execute(query).await?;

        self.full_resync(db).await
    }

    /// Dataset-scoped node and relationship counts.
    pub async fn status(&self) -> GraphResult<GraphCounts> {
        self.client.counts(&self.dataset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(process_id: i64, part_id: i64, quantity: i64, role: &str) -> CompositionRow {
        CompositionRow {
            process_id,
            part_id,
            quantity,
            role: role.to_string(),
        }
    }

    #[test]
    fn test_group_by_process_splits_batches() {
        let rows = vec![row(2, 10, 1, "main"), row(1, 11, 2, ""), row(2, 12, 3, "")];

        let grouped = group_by_process(&rows);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&1].len(), 1);
        assert_eq!(grouped[&2].len(), 2);
        assert_eq!(grouped[&2][0].part_id, 10);
    }

    #[test]
    fn test_group_by_process_orders_ids() {
        let rows = vec![row(5, 1, 1, ""), row(3, 1, 1, ""), row(4, 1, 1, "")];
        let ids: Vec<i64> = group_by_process(&rows).into_keys().collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn test_report_merge_accumulates() {
        let mut total = SyncReport::default();
        total.merge(SyncReport {
            upserted: 2,
            removed: 1,
            failures: vec![],
        });
        let mut failing = SyncReport::default();
        failing.fail("process 9", GraphError::MissingEndpoint("part 9".to_string()));
        total.merge(failing);

        assert_eq!(total.upserted, 2);
        assert_eq!(total.removed, 1);
        assert_eq!(total.failures.len(), 1);
        assert!(!total.is_clean());
    }

    #[test]
    fn test_key_locks_same_key_shares_mutex() {
        let locks = KeyLocks::default();
        let a = locks.for_key(7);
        let b = locks.for_key(7);
        let c = locks.for_key(8);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn test_key_locks_serialize_same_key() {
        let locks = KeyLocks::default();
        let lock = locks.for_key(1);
        let guard = lock.lock().await;

        let contended = locks.for_key(1);
        assert!(contended.try_lock().is_err());
        drop(guard);
        assert!(contended.try_lock().is_ok());
    }
}
