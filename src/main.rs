mod auth;
mod cache;
mod config;
mod db;
mod fields;
mod ipc;
mod layout;
mod photo;
mod render;
mod session;
mod store;
mod uploads;
mod values;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // stdout carries the protocol.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hrportald=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config() -> anyhow::Result<config::AppConfig> {
    match std::env::args_os().nth(1) {
        Some(p) => config::AppConfig::load(&PathBuf::from(p)),
        None => Ok(config::AppConfig::default()),
    }
}

fn main() {
    init_tracing();

    let cfg = match load_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "invalid configuration");
            std::process::exit(2);
        }
    };

    let mut state = ipc::AppState::new(cfg);
    if state.config.store.path.exists() {
        match store::Store::open(&state.config.store.path, &state.config) {
            Ok(s) => state.store = Some(s),
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "database connection failed");
            }
        }
    } else {
        tracing::warn!(
            path = %state.config.store.path.to_string_lossy(),
            "employee database not found; waiting for store.open"
        );
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to answer to.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
