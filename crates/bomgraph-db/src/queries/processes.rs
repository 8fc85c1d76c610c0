//! Process table queries.

use bomgraph_core::ProcessRow;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::pool::{DbError, DbPool, DbResult};

/// Full process record, including descriptive attributes that only live in
/// the relational store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: i64,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub feature_class_1: Option<String>,
    #[serde(default)]
    pub feature_class_2: Option<String>,
    #[serde(default)]
    pub feature_class_3: Option<String>,
    #[serde(default)]
    pub constraint_1: Option<String>,
    #[serde(default)]
    pub constraint_2: Option<String>,
    #[serde(default)]
    pub process_links: Option<String>,
    #[serde(default)]
    pub kit_links: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub loc_mechanical: Option<String>,
    #[serde(default)]
    pub loc_control: Option<String>,
    #[serde(default)]
    pub loc_testing: Option<String>,
    #[serde(default)]
    pub loc_robotics: Option<String>,
}

/// Insert or update a process row.
pub fn upsert_process(pool: &DbPool, record: &ProcessRecord) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO processes (
                 id, name, category,
                 feature_class_1, feature_class_2, feature_class_3,
                 constraint_1, constraint_2, process_links, kit_links, notes,
                 loc_mechanical, loc_control, loc_testing, loc_robotics
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 category = excluded.category,
                 feature_class_1 = excluded.feature_class_1,
                 feature_class_2 = excluded.feature_class_2,
                 feature_class_3 = excluded.feature_class_3,
                 constraint_1 = excluded.constraint_1,
                 constraint_2 = excluded.constraint_2,
                 process_links = excluded.process_links,
                 kit_links = excluded.kit_links,
                 notes = excluded.notes,
                 loc_mechanical = excluded.loc_mechanical,
                 loc_control = excluded.loc_control,
                 loc_testing = excluded.loc_testing,
                 loc_robotics = excluded.loc_robotics,
                 updated_at = datetime('now'),
                 deleted_at = NULL",
            params![
                record.id,
                record.name,
                record.category,
                record.feature_class_1,
                record.feature_class_2,
                record.feature_class_3,
                record.constraint_1,
                record.constraint_2,
                record.process_links,
                record.kit_links,
                record.notes,
                record.loc_mechanical,
                record.loc_control,
                record.loc_testing,
                record.loc_robotics,
            ],
        )?;
        Ok(())
    })
}

/// Get a process by id. Soft-deleted rows are not returned.
pub fn get_process(pool: &DbPool, id: i64) -> DbResult<ProcessRecord> {
    pool.with_conn(|conn| {
        conn.query_row(
            "SELECT id, name, category,
                    feature_class_1, feature_class_2, feature_class_3,
                    constraint_1, constraint_2, process_links, kit_links, notes,
                    loc_mechanical, loc_control, loc_testing, loc_robotics
             FROM processes WHERE id = ?1 AND deleted_at IS NULL",
            params![id],
            |row| {
                Ok(ProcessRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                    feature_class_1: row.get(3)?,
                    feature_class_2: row.get(4)?,
                    feature_class_3: row.get(5)?,
                    constraint_1: row.get(6)?,
                    constraint_2: row.get(7)?,
                    process_links: row.get(8)?,
                    kit_links: row.get(9)?,
                    notes: row.get(10)?,
                    loc_mechanical: row.get(11)?,
                    loc_control: row.get(12)?,
                    loc_testing: row.get(13)?,
                    loc_robotics: row.get(14)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| DbError::NotFound(format!("process {id}")))
    })
}

/// Mark a process as deleted without removing the row.
pub fn soft_delete_process(pool: &DbPool, id: i64) -> DbResult<()> {
    pool.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE processes SET deleted_at = datetime('now') WHERE id = ?1 AND deleted_at IS NULL",
            params![id],
        )?;
        if changed == 0 {
            return Err(DbError::NotFound(format!("process {id}")));
        }
        Ok(())
    })
}

/// Remove a process row entirely; cascades to links and composition.
pub fn hard_delete_process(pool: &DbPool, id: i64) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute("DELETE FROM processes WHERE id = ?1", params![id])?;
        Ok(())
    })
}

/// Count live processes.
pub fn count_processes(pool: &DbPool) -> DbResult<i64> {
    pool.with_conn(|conn| {
        let count =
            conn.query_row("SELECT COUNT(*) FROM processes WHERE deleted_at IS NULL", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    })
}

/// Ids of all live processes, in ascending order.
pub fn live_ids(pool: &DbPool) -> DbResult<Vec<i64>> {
    pool.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT id FROM processes WHERE deleted_at IS NULL ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    })
}

/// All live processes in the shape the sync engine consumes.
pub fn sync_rows(pool: &DbPool) -> DbResult<Vec<ProcessRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, category FROM processes WHERE deleted_at IS NULL ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ProcessRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
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

    fn test_pool() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        pool
    }

    fn record(id: i64, name: &str, category: &str) -> ProcessRecord {
        ProcessRecord {
            id,
            name: name.to_string(),
            category: category.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let pool = test_pool();
        upsert_process(&pool, &record(1, "Assemble frame", "MainProcess")).unwrap();

        let got = get_process(&pool, 1).unwrap();
        assert_eq!(got.name, "Assemble frame");
        assert_eq!(got.category, "MainProcess");
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let pool = test_pool();
        upsert_process(&pool, &record(1, "Assemble frame", "MainProcess")).unwrap();
        upsert_process(&pool, &record(1, "Assemble frame v2", "SubProcess")).unwrap();

        let got = get_process(&pool, 1).unwrap();
        assert_eq!(got.name, "Assemble frame v2");
        assert_eq!(got.category, "SubProcess");
        assert_eq!(count_processes(&pool).unwrap(), 1);
    }

    #[test]
    fn test_soft_delete_hides_row() {
        let pool = test_pool();
        upsert_process(&pool, &record(1, "Assemble frame", "MainProcess")).unwrap();
        soft_delete_process(&pool, 1).unwrap();

        assert!(matches!(get_process(&pool, 1), Err(DbError::NotFound(_))));
        assert_eq!(count_processes(&pool).unwrap(), 0);
        assert!(sync_rows(&pool).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_revives_soft_deleted_row() {
        let pool = test_pool();
        upsert_process(&pool, &record(1, "Assemble frame", "MainProcess")).unwrap();
        soft_delete_process(&pool, 1).unwrap();
        upsert_process(&pool, &record(1, "Assemble frame", "MainProcess")).unwrap();

        assert!(get_process(&pool, 1).is_ok());
    }

    #[test]
    fn test_sync_rows_shape() {
        let pool = test_pool();
        upsert_process(&pool, &record(2, "Weld", "SubProcess")).unwrap();
        upsert_process(&pool, &record(1, "Assemble", "MainProcess")).unwrap();

        let rows = sync_rows(&pool).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].category, "SubProcess");
        assert_eq!(live_ids(&pool).unwrap(), vec![1, 2]);
    }
}
