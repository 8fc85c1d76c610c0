//! Part table queries.

use bomgraph_core::PartRow;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::pool::{DbError, DbPool, DbResult};

/// Full part record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub category_label: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub part_type: Option<String>,
    #[serde(default)]
    pub property_1: Option<String>,
    #[serde(default)]
    pub value_1: Option<String>,
    #[serde(default)]
    pub property_2: Option<String>,
    #[serde(default)]
    pub value_2: Option<String>,
    #[serde(default)]
    pub property_3: Option<String>,
    #[serde(default)]
    pub value_3: Option<String>,
    #[serde(default)]
    pub loc_mechanical: Option<String>,
    #[serde(default)]
    pub loc_control: Option<String>,
    #[serde(default)]
    pub loc_testing: Option<String>,
    #[serde(default)]
    pub loc_robotics: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Insert or update a part row.
pub fn upsert_part(pool: &DbPool, record: &PartRecord) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO parts (
                 id, name, version, category_label, manufacturer, part_type,
                 property_1, value_1, property_2, value_2, property_3, value_3,
                 loc_mechanical, loc_control, loc_testing, loc_robotics, remarks
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 version = excluded.version,
                 category_label = excluded.category_label,
                 manufacturer = excluded.manufacturer,
                 part_type = excluded.part_type,
                 property_1 = excluded.property_1,
                 value_1 = excluded.value_1,
                 property_2 = excluded.property_2,
                 value_2 = excluded.value_2,
                 property_3 = excluded.property_3,
                 value_3 = excluded.value_3,
                 loc_mechanical = excluded.loc_mechanical,
                 loc_control = excluded.loc_control,
                 loc_testing = excluded.loc_testing,
                 loc_robotics = excluded.loc_robotics,
                 remarks = excluded.remarks,
                 updated_at = datetime('now'),
                 deleted_at = NULL",
            params![
                record.id,
                record.name,
                record.version,
                record.category_label,
                record.manufacturer,
                record.part_type,
                record.property_1,
                record.value_1,
                record.property_2,
                record.value_2,
                record.property_3,
                record.value_3,
                record.loc_mechanical,
                record.loc_control,
                record.loc_testing,
                record.loc_robotics,
                record.remarks,
            ],
        )?;
        Ok(())
    })
}

/// Get a part by id. Soft-deleted rows are not returned.
pub fn get_part(pool: &DbPool, id: i64) -> DbResult<PartRecord> {
    pool.with_conn(|conn| {
        conn.query_row(
            "SELECT id, name, version, category_label, manufacturer, part_type,
                    property_1, value_1, property_2, value_2, property_3, value_3,
                    loc_mechanical, loc_control, loc_testing, loc_robotics, remarks
             FROM parts WHERE id = ?1 AND deleted_at IS NULL",
            params![id],
            |row| {
                Ok(PartRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    version: row.get(2)?,
                    category_label: row.get(3)?,
                    manufacturer: row.get(4)?,
                    part_type: row.get(5)?,
                    property_1: row.get(6)?,
                    value_1: row.get(7)?,
                    property_2: row.get(8)?,
                    value_2: row.get(9)?,
                    property_3: row.get(10)?,
                    value_3: row.get(11)?,
                    loc_mechanical: row.get(12)?,
                    loc_control: row.get(13)?,
                    loc_testing: row.get(14)?,
                    loc_robotics: row.get(15)?,
                    remarks: row.get(16)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| DbError::NotFound(format!("part {id}")))
    })
}

/// Mark a part as deleted without removing the row.
pub fn soft_delete_part(pool: &DbPool, id: i64) -> DbResult<()> {
    pool.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE parts SET deleted_at = datetime('now') WHERE id = ?1 AND deleted_at IS NULL",
            params![id],
        )?;
        if changed == 0 {
            return Err(DbError::NotFound(format!("part {id}")));
        }
        Ok(())
    })
}

/// Remove a part row entirely; cascades to composition lines.
pub fn hard_delete_part(pool: &DbPool, id: i64) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute("DELETE FROM parts WHERE id = ?1", params![id])?;
        Ok(())
    })
}

/// Count live parts.
pub fn count_parts(pool: &DbPool) -> DbResult<i64> {
    pool.with_conn(|conn| {
        let count =
            conn.query_row("SELECT COUNT(*) FROM parts WHERE deleted_at IS NULL", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    })
}

/// All live parts in the shape the sync engine consumes.
pub fn sync_rows(pool: &DbPool) -> DbResult<Vec<PartRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, COALESCE(part_type, ''), COALESCE(manufacturer, '')
             FROM parts WHERE deleted_at IS NULL ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PartRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    part_type: row.get(2)?,
                    manufacturer: row.get(3)?,
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

    #[test]
    fn test_upsert_and_get() {
        let pool = test_pool();
        upsert_part(
            &pool,
            &PartRecord {
                id: 10,
                name: "Gripper".to_string(),
                manufacturer: Some("Acme".to_string()),
                part_type: Some("GX-2".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let got = get_part(&pool, 10).unwrap();
        assert_eq!(got.name, "Gripper");
        assert_eq!(got.manufacturer.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_sync_rows_fill_missing_attributes() {
        let pool = test_pool();
        upsert_part(
            &pool,
            &PartRecord {
                id: 10,
                name: "Gripper".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let rows = sync_rows(&pool).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].part_type, "");
        assert_eq!(rows[0].manufacturer, "");
    }

    #[test]
    fn test_soft_delete_hides_row() {
        let pool = test_pool();
        upsert_part(
            &pool,
            &PartRecord {
                id: 10,
                name: "Gripper".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        soft_delete_part(&pool, 10).unwrap();

        assert!(matches!(get_part(&pool, 10), Err(DbError::NotFound(_))));
        assert_eq!(count_parts(&pool).unwrap(), 0);
    }
}
