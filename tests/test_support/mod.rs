#![allow(dead_code)]

use rusqlite::{params, Connection};
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub const TABLE: &str = "employee_center";
pub const EUID_COL: &str = "Employee UID# (EUID#)";
pub const NAME_COL: &str = "Employee Full Name";
pub const MARRIED_COL: &str = "Married? (Y / N choice radio)";
pub const PAN_COL: &str = "PAN Card (document upload / display)";
pub const DEPENDENTS_COL: &str = "Dependents (number input field)";
pub const BLOOD_COL: &str = "Blood Group (drop down)";

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

/// Writes a config pointing the daemon at `db`, with stylesheet and uploads under `dir`.
pub fn write_config(dir: &Path, db: &Path) -> PathBuf {
    let cfg = dir.join("hrportal.toml");
    let text = format!(
        concat!(
            "[store]\npath = '{}'\n\n",
            "[assets]\nstylesheet = '{}'\n\n",
            "[uploads]\ndir = '{}'\n\n",
            "[photo]\ntimeout_secs = 2\n",
        ),
        db.to_string_lossy(),
        dir.join("styles.css").to_string_lossy(),
        dir.join("uploads").to_string_lossy(),
    );
    std::fs::write(&cfg, text).expect("write config");
    cfg
}

pub fn spawn_sidecar(config: &Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_hrportald");
    let mut child = Command::new(exe)
        .arg(config)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn hrportald");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(serde_json::Value::Null)
}

pub fn error_code(value: &serde_json::Value) -> String {
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false), "{}", value);
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Logs in and returns the new session id.
pub fn login(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    euid: i64,
    pin: &str,
) -> String {
    let res = request_ok(stdin, reader, id, "session.login", json!({ "euid": euid, "pin": pin }));
    res.get("sessionId")
        .and_then(|v| v.as_str())
        .expect("sessionId")
        .to_string()
}

const FIXTURE_COLUMNS: &[(&str, &str)] = &[
    ("SECTION- GENERAL DETAILS", "TEXT"),
    ("Employee UID# (EUID#)", "INTEGER"),
    ("PIN", "TEXT"),
    ("Employee Full Name", "TEXT"),
    ("DIVISION", "TEXT"),
    ("Date of Joining", "TEXT"),
    ("SECTION- DEFINITIVES", "TEXT"),
    ("Married? (Y / N choice radio)", "TEXT"),
    ("PAN Card (document upload / display)", "TEXT"),
    ("Blood Group (drop down)", "TEXT"),
    ("SECTION- PERSONAL DETAILS", "TEXT"),
    ("Dependents (number input field)", "REAL"),
    ("DOB", "TEXT"),
    ("Photograph", "TEXT"),
    ("SECTION- PAYROLL", "TEXT"),
    ("Bank", "TEXT"),
    ("SECTION- SALARY BREAK UP", "TEXT"),
    ("Basic AMOUNT", "TEXT"),
    ("House Rent Allowance (HRA) AMOUNT", "TEXT"),
    ("SECTION- LCT", "TEXT"),
    ("Last Promotion", "TEXT"),
    ("SECTION- PR", "TEXT"),
    ("Review#1 Rating", "TEXT"),
    ("Review#1 Comments", "TEXT"),
    ("Review#10 Rating", "TEXT"),
    ("Review#2 Rating", "TEXT"),
];

fn create_table(conn: &Connection, columns: &[(&str, &str)]) {
    let cols: Vec<String> = columns
        .iter()
        .map(|(name, ty)| format!("\"{}\" {}", name.replace('"', "\"\""), ty))
        .collect();
    conn.execute_batch(&format!("CREATE TABLE {} ({});", TABLE, cols.join(", ")))
        .expect("create table");
}

/// Two employees: 1001 with a bcrypt PIN (`4321`), 1002 with a plaintext PIN (`1234`).
pub fn create_fixture_db(dir: &Path) -> PathBuf {
    let path = dir.join("employee_center.db");
    let conn = Connection::open(&path).expect("open fixture db");
    create_table(&conn, FIXTURE_COLUMNS);
    let hashed = bcrypt::hash("4321", 4).expect("hash pin");
    conn.execute(
        "INSERT INTO employee_center (
            \"Employee UID# (EUID#)\", \"PIN\", \"Employee Full Name\", \"DIVISION\",
            \"Date of Joining\", \"Married? (Y / N choice radio)\",
            \"PAN Card (document upload / display)\", \"Blood Group (drop down)\",
            \"Dependents (number input field)\", \"DOB\", \"Photograph\", \"Bank\",
            \"Basic AMOUNT\", \"House Rent Allowance (HRA) AMOUNT\", \"Last Promotion\",
            \"Review#1 Rating\", \"Review#1 Comments\", \"Review#10 Rating\", \"Review#2 Rating\"
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            1001,
            hashed,
            "Asha Rao",
            "Ops",
            "March 15, 2021",
            "Y",
            "pan-1001.pdf",
            "O+",
            2.0,
            "1990-01-05",
            "",
            "HDFC",
            "₹45,000.50",
            "20000",
            "2023",
            "4",
            "Good",
            "3",
            "5",
        ],
    )
    .expect("insert 1001");
    conn.execute(
        "INSERT INTO employee_center (
            \"Employee UID# (EUID#)\", \"PIN\", \"Employee Full Name\", \"DIVISION\",
            \"Photograph\"
        ) VALUES (?, ?, ?, ?, ?)",
        params![1002, "1234", "Vikram Shah", "Finance", "http://127.0.0.1:9/photo.png"],
    )
    .expect("insert 1002");
    path
}

/// Editable sections hold nothing but reserved columns and an empty file column.
pub fn create_sparse_db(dir: &Path) -> PathBuf {
    let path = dir.join("sparse.db");
    let conn = Connection::open(&path).expect("open sparse db");
    create_table(
        &conn,
        &[
            ("SECTION- GENERAL DETAILS", "TEXT"),
            ("Employee UID# (EUID#)", "INTEGER"),
            ("PIN", "TEXT"),
            ("SECTION- DEFINITIVES", "TEXT"),
            ("Scan (document upload / display)", "TEXT"),
            ("SECTION- PERSONAL DETAILS", "TEXT"),
            ("SECTION- PAYROLL", "TEXT"),
        ],
    );
    conn.execute(
        "INSERT INTO employee_center (\"Employee UID# (EUID#)\", \"PIN\") VALUES (?, ?)",
        params![2001, "9999"],
    )
    .expect("insert 2001");
    path
}
