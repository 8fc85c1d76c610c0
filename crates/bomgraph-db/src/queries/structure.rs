//! Structural link (process decomposition) queries.

use bomgraph_core::StructuralLinkRow;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::pool::{DbPool, DbResult};

/// A decomposition row: a main process contains `quantity` instances of a
/// sub-process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralLinkRecord {
    pub parent_process_id: i64,
    pub child_process_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// Insert or update a structural link.
pub fn upsert_link(pool: &DbPool, record: &StructuralLinkRecord) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO structural_links (parent_process_id, child_process_id, quantity)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(parent_process_id, child_process_id) DO UPDATE SET
                 quantity = excluded.quantity,
                 updated_at = datetime('now')",
            params![record.parent_process_id, record.child_process_id, record.quantity],
        )?;
        Ok(())
    })
}

/// Delete a structural link.
pub fn delete_link(pool: &DbPool, parent_id: i64, child_id: i64) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "DELETE FROM structural_links WHERE parent_process_id = ?1 AND child_process_id = ?2",
            params![parent_id, child_id],
        )?;
        Ok(())
    })
}

/// Count structural links between live processes.
pub fn count_links(pool: &DbPool) -> DbResult<i64> {
    pool.with_conn(|conn| {
        let count = conn.query_row(
            "SELECT COUNT(*)
             FROM structural_links l
             JOIN processes p ON p.id = l.parent_process_id AND p.deleted_at IS NULL
             JOIN processes c ON c.id = l.child_process_id AND c.deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    })
}

/// All links whose endpoints are both live, in the shape the sync engine
/// consumes.
pub fn sync_rows(pool: &DbPool) -> DbResult<Vec<StructuralLinkRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT l.parent_process_id, l.child_process_id, l.quantity
             FROM structural_links l
             JOIN processes p ON p.id = l.parent_process_id AND p.deleted_at IS NULL
             JOIN processes c ON c.id = l.child_process_id AND c.deleted_at IS NULL
             ORDER BY l.parent_process_id, l.child_process_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StructuralLinkRow {
                    parent_id: row.get(0)?,
                    child_id: row.get(1)?,
                    quantity: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::queries::processes::{self, ProcessRecord};

    fn test_pool() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        for (id, name, category) in
            [(1, "Assemble", "MainProcess"), (2, "Weld", "SubProcess"), (3, "Test", "SubProcess")]
        {
            processes::upsert_process(
                &pool,
                &ProcessRecord {
                    id,
                    name: name.to_string(),
                    category: category.to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        pool
    }

    fn link(parent: i64, child: i64, quantity: i64) -> StructuralLinkRecord {
        StructuralLinkRecord {
            parent_process_id: parent,
            child_process_id: child,
            quantity,
        }
    }

    #[test]
    fn test_upsert_refreshes_quantity() {
        let pool = test_pool();
        upsert_link(&pool, &link(1, 2, 1)).unwrap();
        upsert_link(&pool, &link(1, 2, 4)).unwrap();

        let rows = sync_rows(&pool).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 4);
    }

    #[test]
    fn test_delete_link() {
        let pool = test_pool();
        upsert_link(&pool, &link(1, 2, 1)).unwrap();
        upsert_link(&pool, &link(1, 3, 2)).unwrap();
        delete_link(&pool, 1, 2).unwrap();

        let rows = sync_rows(&pool).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].child_id, 3);
    }

    #[test]
    fn test_sync_rows_skip_soft_deleted_endpoints() {
        let pool = test_pool();
        upsert_link(&pool, &link(1, 2, 1)).unwrap();
        processes::soft_delete_process(&pool, 2).unwrap();

        assert!(sync_rows(&pool).unwrap().is_empty());
        assert_eq!(count_links(&pool).unwrap(), 0);
    }
}
