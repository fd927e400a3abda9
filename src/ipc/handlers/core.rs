use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::Store;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "storePath": state
                .store
                .as_ref()
                .map(|s| s.path.to_string_lossy().to_string())
                .unwrap_or_else(|| state.config.store.path.to_string_lossy().to_string()),
            "storeOpen": state.store.is_some(),
            "sessions": state.sessions.len(),
        }),
    )
}

/// Opens `params.path`, or the configured database when omitted.
fn handle_store_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config.store.path.clone());

    match Store::open(&path, &state.config) {
        Ok(store) => {
            let columns = store.layout.columns.len();
            let sections: Vec<serde_json::Value> = store
                .layout
                .sections()
                .iter()
                .map(|s| {
                    json!({
                        "key": s.section.key(),
                        "title": s.section.title(),
                        "fieldCount": s.fields.len(),
                    })
                })
                .collect();
            state.store = Some(store);
            ok(
                &req.id,
                json!({
                    "storePath": path.to_string_lossy(),
                    "columnCount": columns,
                    "sections": sections,
                }),
            )
        }
        Err(e) => {
            tracing::error!(
                path = %path.to_string_lossy(),
                error = %format!("{e:#}"),
                "database connection failed"
            );
            err(
                &req.id,
                "db_open_failed",
                "Failed to connect to the database.",
                Some(json!({ "reason": format!("{e:#}") })),
            )
        }
    }
}

fn handle_cache_invalidate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return ok(&req.id, json!({ "invalidated": false }));
    };
    let was_loaded = store.cache_loaded();
    store.invalidate();
    ok(&req.id, json!({ "invalidated": was_loaded }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "store.open" => Some(handle_store_open(state, req)),
        "cache.invalidate" => Some(handle_cache_invalidate(state, req)),
        _ => None,
    }
}
