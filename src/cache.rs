use rusqlite::Connection;
use std::sync::Arc;

use crate::db::{self, EmployeeRecord};

/// Read-through cache of the whole employee table.
///
/// Filled on first read and dropped on `invalidate`: after every write, on
/// store reopen, and on explicit request.
#[derive(Debug, Default)]
pub struct RecordCache {
    records: Option<Arc<Vec<EmployeeRecord>>>,
    loads: u64,
}

impl RecordCache {
    pub fn get_or_load(
        &mut self,
        conn: &Connection,
        table: &str,
        id_column: &str,
    ) -> anyhow::Result<Arc<Vec<EmployeeRecord>>> {
        if let Some(r) = &self.records {
            return Ok(Arc::clone(r));
        }
        let loaded = Arc::new(db::load_records(conn, table, id_column)?);
        self.loads += 1;
        tracing::debug!(rows = loaded.len(), loads = self.loads, "employee records loaded");
        self.records = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn invalidate(&mut self) {
        if self.records.take().is_some() {
            tracing::debug!("employee record cache invalidated");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.records.is_some()
    }

    #[cfg(test)]
    pub fn load_count(&self) -> u64 {
        self.loads
    }
}

pub fn find_record(records: &[EmployeeRecord], euid: i64) -> Option<&EmployeeRecord> {
    records.iter().find(|r| r.euid == Some(euid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch(
            "CREATE TABLE t(id INTEGER, name TEXT);
             INSERT INTO t VALUES (1, 'a');
             INSERT INTO t VALUES (2, 'b');",
        )
        .expect("seed");
        conn
    }

    #[test]
    fn reads_through_once_until_invalidated() {
        let conn = conn();
        let mut cache = RecordCache::default();
        assert!(!cache.is_loaded());

        let first = cache.get_or_load(&conn, "t", "id").expect("load");
        assert_eq!(first.len(), 2);
        conn.execute("INSERT INTO t VALUES (3, 'c')", []).expect("insert");

        // stale until invalidated
        let second = cache.get_or_load(&conn, "t", "id").expect("cached");
        assert_eq!(second.len(), 2);
        assert_eq!(cache.load_count(), 1);

        cache.invalidate();
        let third = cache.get_or_load(&conn, "t", "id").expect("reload");
        assert_eq!(third.len(), 3);
        assert_eq!(cache.load_count(), 2);
        assert!(find_record(&third, 3).is_some());
        assert!(find_record(&third, 9).is_none());
    }
}
