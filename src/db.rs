use anyhow::{anyhow, Context};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::values::{coerce_euid, display_value};

static NULL: Value = Value::Null;

/// One row of the employee table, keyed by column name.
#[derive(Debug, Clone)]
pub struct EmployeeRecord {
    pub euid: Option<i64>,
    cells: HashMap<String, Value>,
}

impl EmployeeRecord {
    pub fn new(euid: Option<i64>, cells: HashMap<String, Value>) -> Self {
        Self { euid, cells }
    }

    /// Missing columns read as NULL.
    pub fn get(&self, column: &str) -> &Value {
        self.cells.get(column).unwrap_or(&NULL)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Opens an existing store. Rows are provisioned elsewhere, so nothing is created here.
pub fn open_store(path: &Path) -> anyhow::Result<Connection> {
    if !path.is_file() {
        return Err(anyhow!(
            "employee database not found: {}",
            path.to_string_lossy()
        ));
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open {}", path.to_string_lossy()))?;
    Ok(conn)
}

/// Column names in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> anyhow::Result<Vec<String>> {
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    if names.is_empty() {
        return Err(anyhow!("table {} has no columns or does not exist", table));
    }
    Ok(names)
}

pub fn load_records(
    conn: &Connection,
    table: &str,
    id_column: &str,
) -> anyhow::Result<Vec<EmployeeRecord>> {
    let sql = format!("SELECT * FROM {}", quote_ident(table));
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("failed to read table {}", table))?;
    let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let v: Value = row.get(i)?;
            let v = match v {
                Value::Text(s) => Value::Text(s.trim().to_string()),
                other => other,
            };
            cells.insert(name.clone(), v);
        }
        let euid = cells.get(id_column).and_then(coerce_euid);
        out.push(EmployeeRecord::new(euid, cells));
    }
    Ok(out)
}

/// Non-null, non-blank distinct values in first-seen order.
pub fn distinct_values(
    conn: &Connection,
    table: &str,
    column: &str,
) -> anyhow::Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT {col} FROM {tbl} WHERE {col} IS NOT NULL",
        col = quote_ident(column),
        tbl = quote_ident(table)
    );
    let mut stmt = conn.prepare(&sql)?;
    let values = stmt
        .query_map([], |row| row.get::<_, Value>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        let s = match v {
            Value::Text(s) => s.trim().to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Null | Value::Blob(_) => continue,
        };
        if !s.is_empty() && !out.contains(&s) {
            out.push(s);
        }
    }
    Ok(out)
}

/// Single UPDATE statement for the whole change set. Returns affected rows.
///
/// `key` is bound as stored so TEXT and INTEGER identifier columns both match.
pub fn update_record(
    conn: &Connection,
    table: &str,
    id_column: &str,
    key: &Value,
    changes: &BTreeMap<String, Value>,
) -> anyhow::Result<usize> {
    if changes.is_empty() {
        return Ok(0);
    }
    let set_clause = changes
        .keys()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote_ident(table),
        set_clause,
        quote_ident(id_column)
    );
    let mut bind: Vec<Value> = changes.values().cloned().collect();
    bind.push(key.clone());
    let n = conn
        .execute(&sql, params_from_iter(bind))
        .with_context(|| format!("failed to update row {}", display_value(key)))?;
    Ok(n)
}
