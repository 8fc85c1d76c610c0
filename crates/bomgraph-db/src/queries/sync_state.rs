//! Sync bookkeeping.
//!
//! After a successful projection run the synced entity ids are stamped here
//! with a monotonically growing version. Purely informational: the sync
//! engine never reads this to decide what to write, it always derives from
//! current relational state.

use rusqlite::params;

use crate::pool::{DbPool, DbResult};

/// Stamp a set of entities of one kind as synced now.
pub fn mark_synced(pool: &DbPool, entity_type: &str, ids: &[i64]) -> DbResult<()> {
    pool.with_conn(|conn| {
        for id in ids {
            conn.execute(
                "INSERT OR REPLACE INTO sync_state (entity_type, entity_id, last_synced_at, sync_version)
                 VALUES (?1, ?2, datetime('now'), COALESCE(
                     (SELECT sync_version FROM sync_state WHERE entity_type = ?1 AND entity_id = ?2), 0
                 ) + 1)",
                params![entity_type, id],
            )?;
        }
        Ok(())
    })
}

/// The most recent sync timestamp across all entity kinds.
pub fn last_sync_time(pool: &DbPool) -> DbResult<Option<String>> {
    pool.with_conn(|conn| {
        let latest = conn.query_row("SELECT MAX(last_synced_at) FROM sync_state", [], |row| {
            row.get::<_, Option<String>>(0)
        })?;
        Ok(latest)
    })
}

/// Current sync version of one entity, if it was ever synced.
pub fn sync_version(pool: &DbPool, entity_type: &str, id: i64) -> DbResult<Option<i64>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT sync_version FROM sync_state WHERE entity_type = ?1 AND entity_id = ?2",
        )?;
        let mut rows = stmt.query(params![entity_type, id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    #[test]
    fn test_mark_synced_bumps_version() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();

        mark_synced(&pool, "process", &[1, 2]).unwrap();
        mark_synced(&pool, "process", &[1]).unwrap();

        assert_eq!(sync_version(&pool, "process", 1).unwrap(), Some(2));
        assert_eq!(sync_version(&pool, "process", 2).unwrap(), Some(1));
        assert_eq!(sync_version(&pool, "part", 1).unwrap(), None);
    }

    #[test]
    fn test_last_sync_time() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();

        assert_eq!(last_sync_time(&pool).unwrap(), None);
        mark_synced(&pool, "part", &[7]).unwrap();
        assert!(last_sync_time(&pool).unwrap().is_some());
    }
}
