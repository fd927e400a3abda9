use std::sync::Arc;

use crate::cache::find_record;
use crate::db::EmployeeRecord;
use crate::ipc::error::HandlerErr;
use crate::ipc::types::{AppState, Request};
use crate::session::{Page, TransitionError};
use crate::store::Store;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn require_store(state: &mut AppState) -> Result<&mut Store, HandlerErr> {
    state
        .store
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_store", "employee database is not available"))
}

/// EUID of the session named in `params.sessionId`, optionally pinned to a page.
pub fn require_session(
    state: &AppState,
    req: &Request,
    page: Option<Page>,
) -> Result<(String, i64), HandlerErr> {
    let session_id = get_required_str(&req.params, "sessionId")?;
    let session_state = state.sessions.state_of(&session_id);
    let euid = state
        .sessions
        .get(&session_id)
        .ok_or(TransitionError::NotAuthenticated)
        .and_then(|s| s.require_euid())
        .map_err(|e| HandlerErr::new(e.code(), e.message()))?;
    if let Some(wanted) = page {
        if session_state.page() != Some(wanted) {
            return Err(HandlerErr {
                code: "wrong_page",
                message: format!("select the {} page first", wanted.as_str()),
                details: Some(serde_json::json!({
                    "phase": session_state.phase(),
                })),
            });
        }
    }
    Ok((session_id, euid))
}

pub fn load_records(store: &mut Store) -> Result<Arc<Vec<EmployeeRecord>>, HandlerErr> {
    store.records().map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "failed to load employee data");
        HandlerErr::new("db_query_failed", "Failed to load employee data.")
    })
}

/// Record of the logged-in employee, cloned out of the cache.
pub fn current_record(store: &mut Store, euid: i64) -> Result<EmployeeRecord, HandlerErr> {
    let records = load_records(store)?;
    if records.is_empty() {
        return Err(HandlerErr::new("not_found", "No employee data available."));
    }
    find_record(&records, euid).cloned().ok_or_else(|| {
        tracing::warn!(euid, "employee row not found");
        HandlerErr::new("not_found", "Employee data not found.")
    })
}
