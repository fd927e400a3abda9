use rusqlite::types::Value;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::RecordCache;
use crate::config::AppConfig;
use crate::db::{self, EmployeeRecord};
use crate::fields::DIVISION_COLUMN;
use crate::layout::SectionLayout;

/// The shared connection plus everything derived from it.
pub struct Store {
    pub path: PathBuf,
    conn: Connection,
    table: String,
    id_column: String,
    pub layout: SectionLayout,
    cache: RecordCache,
}

impl Store {
    pub fn open(path: &Path, cfg: &AppConfig) -> anyhow::Result<Self> {
        let conn = db::open_store(path)?;
        let columns = db::table_columns(&conn, &cfg.store.table)?;
        if !columns.iter().any(|c| *c == cfg.columns.id) {
            tracing::warn!(
                column = %cfg.columns.id,
                "identifier column missing; no employee will be able to log in"
            );
        }
        let layout = SectionLayout::resolve(columns, cfg);
        tracing::info!(
            path = %path.to_string_lossy(),
            columns = layout.columns.len(),
            "employee store opened"
        );
        Ok(Self {
            path: path.to_path_buf(),
            conn,
            table: cfg.store.table.clone(),
            id_column: cfg.columns.id.clone(),
            layout,
            cache: RecordCache::default(),
        })
    }

    pub fn records(&mut self) -> anyhow::Result<Arc<Vec<EmployeeRecord>>> {
        self.cache
            .get_or_load(&self.conn, &self.table, &self.id_column)
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    pub fn cache_loaded(&self) -> bool {
        self.cache.is_loaded()
    }

    pub fn divisions(&self) -> anyhow::Result<Vec<String>> {
        if !self.layout.columns.iter().any(|c| c == DIVISION_COLUMN) {
            return Ok(Vec::new());
        }
        db::distinct_values(&self.conn, &self.table, DIVISION_COLUMN)
    }

    /// Writes the change set for one employee, then drops the cache.
    pub fn update(
        &mut self,
        key: &Value,
        changes: &BTreeMap<String, Value>,
    ) -> anyhow::Result<usize> {
        let n = db::update_record(&self.conn, &self.table, &self.id_column, key, changes)?;
        self.cache.invalidate();
        Ok(n)
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }
}
