use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::Path;

/// Missing stylesheet is a warning, not an error.
pub fn read_stylesheet(path: &Path) -> Result<String, String> {
    match std::fs::read_to_string(path) {
        Ok(css) => Ok(css),
        Err(e) => {
            tracing::error!(path = %path.to_string_lossy(), error = %e, "stylesheet not loaded");
            Err(format!("CSS file {} not found.", path.to_string_lossy()))
        }
    }
}

fn handle_stylesheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = state.config.assets.stylesheet.clone();
    match read_stylesheet(&path) {
        Ok(css) => ok(
            &req.id,
            json!({ "found": true, "path": path.to_string_lossy(), "css": css }),
        ),
        Err(warning) => ok(
            &req.id,
            json!({ "found": false, "path": path.to_string_lossy(), "warning": warning }),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assets.stylesheet" => Some(handle_stylesheet(state, req)),
        _ => None,
    }
}
