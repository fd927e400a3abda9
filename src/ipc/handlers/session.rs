use crate::auth;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::helpers::{get_required_str, load_records};
use crate::ipc::types::{AppState, Request};
use crate::session::{Page, SessionState};
use crate::values::{coerce_euid, display_value};
use rusqlite::types::Value;
use serde_json::json;

fn parse_euid(v: Option<&serde_json::Value>) -> Option<i64> {
    match v? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => coerce_euid(&Value::Text(s.clone())),
        _ => None,
    }
}

fn state_json(session_id: &str, s: SessionState) -> serde_json::Value {
    json!({
        "sessionId": session_id,
        "phase": s.phase(),
        "euid": s.euid(),
        "page": s.page().map(|p| p.as_str()),
    })
}

/// Selector of known EUIDs, or free-text entry when nothing could be loaded.
fn handle_login_options(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return ok(&req.id, json!({ "mode": "freeText", "euids": [] }));
    };
    let records = match load_records(store) {
        Ok(r) => r,
        Err(e) => {
            return ok(
                &req.id,
                json!({ "mode": "freeText", "euids": [], "warning": e.message }),
            )
        }
    };
    let mut euids: Vec<i64> = Vec::new();
    for euid in records.iter().filter_map(|r| r.euid) {
        if !euids.contains(&euid) {
            euids.push(euid);
        }
    }
    let mode = if euids.is_empty() { "freeText" } else { "select" };
    ok(&req.id, json!({ "mode": mode, "euids": euids }))
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw_euid) = req.params.get("euid") else {
        return err(&req.id, "bad_params", "missing euid", None);
    };
    let pin = match get_required_str(&req.params, "pin") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    // An identifier that cannot name a row is just an unknown employee.
    let Some(euid) = parse_euid(Some(raw_euid)) else {
        tracing::warn!(euid = %raw_euid, "login rejected: EUID is not a whole number");
        return err(&req.id, "invalid_credentials", "Invalid credentials", None);
    };

    let requested = req
        .params
        .get("sessionId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    if let Some(id) = &requested {
        if state.sessions.state_of(id).euid().is_some() {
            return err(
                &req.id,
                "already_authenticated",
                "session is already logged in",
                None,
            );
        }
    }

    let pin_column = state.config.columns.pin.clone();
    let name_column = state.config.columns.full_name.clone();
    let Some(store) = state.store.as_mut() else {
        tracing::warn!(euid, "employee data unavailable; authentication failed");
        return err(&req.id, "invalid_credentials", "Invalid credentials", None);
    };
    let records = match store.records() {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(
                euid,
                error = %format!("{e:#}"),
                "employee data unavailable; authentication failed"
            );
            return err(&req.id, "invalid_credentials", "Invalid credentials", None);
        }
    };
    if records.is_empty() {
        tracing::warn!("employee data is empty; authentication failed");
        return err(&req.id, "invalid_credentials", "Invalid credentials", None);
    }
    if !auth::authenticate(&records, &pin_column, euid, &pin) {
        return err(&req.id, "invalid_credentials", "Invalid credentials", None);
    }
    let full_name = crate::cache::find_record(&records, euid)
        .map(|r| display_value(r.get(&name_column)))
        .unwrap_or_default();

    let session_id = match requested.filter(|id| state.sessions.get(id).is_some()) {
        Some(id) => id,
        None => state.sessions.open(),
    };
    let login = state
        .sessions
        .get_mut(&session_id)
        .ok_or_else(|| HandlerErr::new("not_found", "session vanished"))
        .and_then(|s| {
            s.login(euid)
                .map_err(|e| HandlerErr::new(e.code(), e.message()))
        });
    if let Err(e) = login {
        return e.response(&req.id);
    }

    tracing::info!(euid, "logged in");
    ok(
        &req.id,
        json!({
            "sessionId": session_id,
            "euid": euid,
            "fullName": full_name,
            "message": format!("Logged in as EUID# {} | {}", euid, full_name),
        }),
    )
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match get_required_str(&req.params, "sessionId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let euid = state.sessions.state_of(&session_id).euid();
    let closed = state.sessions.close(&session_id);
    if let Some(euid) = euid {
        tracing::info!(euid, "logged out");
    }
    ok(
        &req.id,
        json!({ "loggedOut": closed, "phase": SessionState::Anonymous.phase() }),
    )
}

fn handle_state(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match get_required_str(&req.params, "sessionId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    ok(
        &req.id,
        state_json(&session_id, state.sessions.state_of(&session_id)),
    )
}

fn handle_dashboard_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match get_required_str(&req.params, "sessionId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let page_raw = match get_required_str(&req.params, "page") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let Some(page) = Page::parse(&page_raw) else {
        return err(
            &req.id,
            "bad_params",
            "page must be one of: view, edit, moreApps",
            Some(json!({ "page": page_raw })),
        );
    };
    let Some(session) = state.sessions.get_mut(&session_id) else {
        return err(&req.id, "not_authenticated", "log in first", None);
    };
    if let Err(e) = session.select_page(page) {
        return err(&req.id, e.code(), e.message(), None);
    }
    let s = session.state();
    tracing::info!(euid = ?s.euid(), page = page.as_str(), "dashboard page selected");
    ok(&req.id, state_json(&session_id, s))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.loginOptions" => Some(handle_login_options(state, req)),
        "session.login" => Some(handle_login(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        "session.state" => Some(handle_state(state, req)),
        "dashboard.select" => Some(handle_dashboard_select(state, req)),
        _ => None,
    }
}
