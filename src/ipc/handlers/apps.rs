use crate::ipc::error::ok;
use crate::ipc::helpers::require_session;
use crate::ipc::types::{AppState, Request};
use crate::session::Page;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AppLink {
    pub name: &'static str,
    pub url: &'static str,
    pub description: &'static str,
}

pub const MORE_APPS: [AppLink; 4] = [
    AppLink {
        name: "Attendance App",
        url: "https://example.com/attendance",
        description: "Track your daily attendance.",
    },
    AppLink {
        name: "Leave Request App",
        url: "https://example.com/leave-request",
        description: "Submit and track your leave requests.",
    },
    AppLink {
        name: "Salary Advance Request App",
        url: "https://example.com/salary-advance",
        description: "Request for salary advances.",
    },
    AppLink {
        name: "HR Grievance App",
        url: "https://example.com/hr-grievance",
        description: "File and manage HR grievances.",
    },
];

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = require_session(state, req, Some(Page::MoreApps)) {
        return e.response(&req.id);
    }
    ok(&req.id, json!({ "apps": MORE_APPS }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "apps.list" => Some(handle_list(state, req)),
        _ => None,
    }
}
