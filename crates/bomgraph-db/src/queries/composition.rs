//! Effective composition (BOM line) queries.
//!
//! Identity of a line is (process, part, role). Roles are stored as plain
//! strings with '' meaning "no role"; `normalize_role` is applied on the way
//! in so the composite key never sees NULL.

use bomgraph_core::{BomRow, normalize_role};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::pool::{DbPool, DbResult};

/// One BOM line as written by the CRUD layer or the bulk import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionRecord {
    pub process_id: i64,
    pub part_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub role: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

/// Insert or update a BOM line.
pub fn upsert_line(pool: &DbPool, record: &CompositionRecord) -> DbResult<()> {
    let role = normalize_role(record.role.as_deref());
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO composition (process_id, part_id, role, quantity)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(process_id, part_id, role) DO UPDATE SET
                 quantity = excluded.quantity,
                 updated_at = datetime('now')",
            params![record.process_id, record.part_id, role, record.quantity],
        )?;
        Ok(())
    })
}

/// Delete BOM lines for a (process, part) pair. With a role only that slot
/// is removed; without one, every role slot for the pair goes.
pub fn delete_lines(pool: &DbPool, process_id: i64, part_id: i64, role: Option<&str>) -> DbResult<()> {
    pool.with_conn(|conn| {
        match role {
            Some(role) => {
                conn.execute(
                    "DELETE FROM composition WHERE process_id = ?1 AND part_id = ?2 AND role = ?3",
                    params![process_id, part_id, normalize_role(Some(role))],
                )?;
            }
            None => {
                conn.execute(
                    "DELETE FROM composition WHERE process_id = ?1 AND part_id = ?2",
                    params![process_id, part_id],
                )?;
            }
        }
        Ok(())
    })
}

/// Count BOM lines between live processes and parts.
pub fn count_lines(pool: &DbPool) -> DbResult<i64> {
    pool.with_conn(|conn| {
        let count = conn.query_row(
            "SELECT COUNT(*)
             FROM composition c
             JOIN processes p ON p.id = c.process_id AND p.deleted_at IS NULL
             JOIN parts m ON m.id = c.part_id AND m.deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    })
}

/// The current, complete BOM of one process: every live line, ready for
/// reconciliation. Lines pointing at soft-deleted parts drop out here, so
/// their graph edges are pruned on the next reconcile.
pub fn effective_rows(pool: &DbPool, process_id: i64) -> DbResult<Vec<BomRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT c.part_id, c.quantity, c.role
             FROM composition c
             JOIN processes p ON p.id = c.process_id AND p.deleted_at IS NULL
             JOIN parts m ON m.id = c.part_id AND m.deleted_at IS NULL
             WHERE c.process_id = ?1
             ORDER BY c.part_id, c.role",
        )?;
        let rows = stmt
            .query_map(params![process_id], |row| {
                Ok(BomRow {
                    part_id: row.get(0)?,
                    quantity: row.get(1)?,
                    role: row.get(2)?,
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
    use crate::queries::parts::{self, PartRecord};
    use crate::queries::processes::{self, ProcessRecord};

    fn test_pool() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        processes::upsert_process(
            &pool,
            &ProcessRecord {
                id: 1,
                name: "Assemble".to_string(),
                category: "MainProcess".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        for id in [10, 11] {
            parts::upsert_part(
                &pool,
                &PartRecord {
                    id,
                    name: format!("Part {id}"),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        pool
    }

    fn line(process_id: i64, part_id: i64, quantity: i64, role: Option<&str>) -> CompositionRecord {
        CompositionRecord {
            process_id,
            part_id,
            quantity,
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_upsert_refreshes_quantity() {
        let pool = test_pool();
        upsert_line(&pool, &line(1, 10, 1, Some("main"))).unwrap();
        upsert_line(&pool, &line(1, 10, 5, Some("main"))).unwrap();

        let rows = effective_rows(&pool, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 5);
    }

    #[test]
    fn test_roles_are_distinct_slots() {
        let pool = test_pool();
        upsert_line(&pool, &line(1, 10, 2, Some("main"))).unwrap();
        upsert_line(&pool, &line(1, 10, 3, Some("backup"))).unwrap();
        upsert_line(&pool, &line(1, 10, 1, None)).unwrap();

        let rows = effective_rows(&pool, 1).unwrap();
        assert_eq!(rows.len(), 3);
        let roles: Vec<&str> = rows.iter().map(|r| r.role.as_str()).collect();
        assert_eq!(roles, vec!["", "backup", "main"]);
    }

    #[test]
    fn test_delete_single_role_slot() {
        let pool = test_pool();
        upsert_line(&pool, &line(1, 10, 2, Some("main"))).unwrap();
        upsert_line(&pool, &line(1, 10, 3, Some("backup"))).unwrap();
        delete_lines(&pool, 1, 10, Some("main")).unwrap();

        let rows = effective_rows(&pool, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, "backup");
    }

    #[test]
    fn test_delete_all_roles_for_pair() {
        let pool = test_pool();
        upsert_line(&pool, &line(1, 10, 2, Some("main"))).unwrap();
        upsert_line(&pool, &line(1, 10, 3, Some("backup"))).unwrap();
        upsert_line(&pool, &line(1, 11, 1, None)).unwrap();
        delete_lines(&pool, 1, 10, None).unwrap();

        let rows = effective_rows(&pool, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].part_id, 11);
    }

    #[test]
    fn test_effective_rows_skip_soft_deleted_parts() {
        let pool = test_pool();
        upsert_line(&pool, &line(1, 10, 2, Some("main"))).unwrap();
        upsert_line(&pool, &line(1, 11, 1, None)).unwrap();
        parts::soft_delete_part(&pool, 10).unwrap();

        let rows = effective_rows(&pool, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].part_id, 11);
    }
}
