use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::helpers::{current_record, require_session, require_store};
use crate::ipc::types::{AppState, Request};
use crate::layout::Section;
use crate::photo;
use crate::render::{
    self, division_options, EditContext, FormSubmission, ReservedColumns, Upload,
};
use crate::session::Page;
use crate::uploads;
use crate::values::display_value;

fn reserved_columns(state: &AppState) -> ReservedColumns {
    ReservedColumns {
        id: state.config.columns.id.clone(),
        pin: state.config.columns.pin.clone(),
        photo: state.config.columns.photo.clone(),
    }
}

fn header_json(euid: i64, full_name: String) -> serde_json::Value {
    json!({ "euid": euid, "fullName": full_name })
}

fn handle_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, euid) = match require_session(state, req, Some(Page::View)) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let reserved = reserved_columns(state);
    let name_column = state.config.columns.full_name.clone();
    let store = match require_store(state) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    let record = match current_record(store, euid) {
        Ok(r) => r,
        Err(e) => return e.response(&req.id),
    };
    tracing::info!(euid, "viewing employee profile");

    let tabs: Vec<serde_json::Value> = Section::ALL
        .iter()
        .map(|section| {
            let fields = &store.layout.section(*section).fields;
            let mut tab = json!({
                "key": section.key(),
                "title": section.title(),
            });
            match section {
                Section::SalaryBreakup => {
                    tab["salary"] = json!(render::salary_breakup(&record));
                }
                Section::PerformanceReviews => {
                    tab["reviews"] = json!(render::group_reviews(&record, fields));
                }
                _ => {
                    tab["fields"] = json!(render::render_readonly(&record, fields, &reserved));
                }
            }
            tab
        })
        .collect();

    let has_photo = !display_value(record.get(&reserved.photo)).trim().is_empty();
    ok(
        &req.id,
        json!({
            "header": header_json(euid, display_value(record.get(&name_column))),
            "hasPhoto": has_photo,
            "tabs": tabs,
        }),
    )
}

fn handle_photo(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, euid) = match require_session(state, req, Some(Page::View)) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let photo_column = state.config.columns.photo.clone();
    let timeout = Duration::from_secs(state.config.photo.timeout_secs);
    let store = match require_store(state) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    let record = match current_record(store, euid) {
        Ok(r) => r,
        Err(e) => return e.response(&req.id),
    };
    let url = display_value(record.get(&photo_column));
    ok(&req.id, json!(photo::fetch_profile_image(&url, timeout)))
}

fn edit_context(state: &mut AppState) -> Result<(EditContext, Option<String>), HandlerErr> {
    let reserved = reserved_columns(state);
    let default_option = state.config.division.default_option.clone();
    let store = require_store(state)?;
    let (stored, warning) = match store.divisions() {
        Ok(v) => (v, None),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "failed to read division options");
            let warning = "Division list unavailable; only the default is offered.";
            (Vec::new(), Some(warning.to_string()))
        }
    };
    Ok((
        EditContext {
            reserved,
            division_options: division_options(stored, &default_option),
        },
        warning,
    ))
}

fn handle_edit_form(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, euid) = match require_session(state, req, Some(Page::Edit)) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let name_column = state.config.columns.full_name.clone();
    let (ctx, division_warning) = match edit_context(state) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let store = match require_store(state) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    let record = match current_record(store, euid) {
        Ok(r) => r,
        Err(e) => return e.response(&req.id),
    };
    tracing::info!(euid, "editing employee profile");

    let tabs: Vec<serde_json::Value> = Section::ALL
        .iter()
        .map(|section| {
            let fields = &store.layout.section(*section).fields;
            if section.editable() {
                json!({
                    "key": section.key(),
                    "title": section.title(),
                    "editable": true,
                    "inputs": render::render_editable(fields, &record, &ctx),
                })
            } else {
                json!({
                    "key": section.key(),
                    "title": section.title(),
                    "editable": false,
                    "fields": render::render_readonly(&record, fields, &ctx.reserved),
                })
            }
        })
        .collect();

    let mut result = json!({
        "header": header_json(euid, display_value(record.get(&name_column))),
        "tabs": tabs,
        "submitLabel": "Save Changes",
    });
    if let Some(w) = division_warning {
        result["warning"] = json!(w);
    }
    ok(&req.id, result)
}

fn parse_submission(params: &serde_json::Value) -> Result<FormSubmission, HandlerErr> {
    let mut sub = FormSubmission::default();
    match params.get("values") {
        None | Some(serde_json::Value::Null) => {}
        Some(serde_json::Value::Object(map)) => {
            sub.values = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        }
        Some(_) => return Err(HandlerErr::new("bad_params", "values must be an object")),
    }
    sub.new_division = params
        .get("newDivision")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let mut uploads = HashMap::new();
    if let Some(raw) = params.get("uploads") {
        let Some(map) = raw.as_object() else {
            return Err(HandlerErr::new("bad_params", "uploads must be an object"));
        };
        for (column, u) in map {
            let name = u
                .get("name")
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| HandlerErr {
                    code: "bad_params",
                    message: "upload needs a file name".to_string(),
                    details: Some(json!({ "column": column })),
                })?;
            let name = uploads::sanitize_file_name(&name).map_err(|e| HandlerErr {
                code: "bad_params",
                message: e.to_string(),
                details: Some(json!({ "column": column })),
            })?;
            let content = match u.get("contentBase64").and_then(|v| v.as_str()) {
                Some(b64) => {
                    let bytes = general_purpose::STANDARD.decode(b64).map_err(|e| HandlerErr {
                        code: "bad_params",
                        message: format!("upload content is not base64: {e}"),
                        details: Some(json!({ "column": column })),
                    })?;
                    Some(bytes)
                }
                None => None,
            };
            uploads.insert(column.clone(), Upload { name, content });
        }
    }
    sub.uploads = uploads;
    Ok(sub)
}

/// Collects every editable section and writes them as one update, or nothing at all.
fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, euid) = match require_session(state, req, Some(Page::Edit)) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let mut submission = match parse_submission(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let uploads_root = state.config.uploads.dir.clone();
    let (ctx, _) = match edit_context(state) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let store = match require_store(state) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    let record = match current_record(store, euid) {
        Ok(r) => r,
        Err(e) => return e.response(&req.id),
    };

    for column in render::retain_file_uploads(&store.layout, &mut submission) {
        tracing::warn!(euid, column = %column, "upload ignored: not an editable file field");
    }
    let changes = render::collect_all(&store.layout, &record, &ctx, &submission);
    if changes.is_empty() {
        tracing::info!(euid, "no changes to save");
        return ok(
            &req.id,
            json!({ "saved": false, "message": "No changes to save.", "updatedColumns": [] }),
        );
    }

    let mut staged = Vec::new();
    for (column, upload) in &submission.uploads {
        let Some(content) = &upload.content else {
            continue;
        };
        match uploads::stage_upload(&uploads_root, euid, column, &upload.name, content) {
            Ok(s) => staged.push(s),
            Err(e) => {
                tracing::error!(
                    euid,
                    column = %column,
                    error = %format!("{e:#}"),
                    "failed to store upload"
                );
                staged.into_iter().for_each(uploads::StagedUpload::discard);
                return err(
                    &req.id,
                    "upload_failed",
                    "Failed to store the uploaded file.",
                    Some(json!({ "column": column })),
                );
            }
        }
    }

    let key = record.get(store.id_column()).clone();
    match store.update(&key, &changes) {
        Ok(0) => {
            staged.into_iter().for_each(uploads::StagedUpload::discard);
            tracing::warn!(euid, "update matched no row");
            err(&req.id, "not_found", "Employee data not found.", None)
        }
        Ok(_) => {
            tracing::info!(euid, columns = changes.len(), "employee data updated");
            let mut stored_uploads = Vec::with_capacity(staged.len());
            let mut pending = staged.into_iter();
            while let Some(s) = pending.next() {
                match s.commit() {
                    Ok(stored) => stored_uploads.push(stored),
                    Err(e) => {
                        tracing::error!(euid, error = %format!("{e:#}"), "failed to place upload");
                        pending.for_each(uploads::StagedUpload::discard);
                        return err(
                            &req.id,
                            "upload_failed",
                            "Failed to store the uploaded file.",
                            Some(json!({ "saved": true })),
                        );
                    }
                }
            }
            let updated: Vec<&String> = changes.keys().collect();
            ok(
                &req.id,
                json!({
                    "saved": true,
                    "message": "Your profile has been updated successfully!",
                    "updatedColumns": updated,
                    "uploads": stored_uploads,
                }),
            )
        }
        Err(e) => {
            staged.into_iter().for_each(uploads::StagedUpload::discard);
            tracing::error!(euid, error = %format!("{e:#}"), "failed to update employee data");
            err(
                &req.id,
                "db_update_failed",
                "Failed to update your profile.",
                None,
            )
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profile.view" => Some(handle_view(state, req)),
        "profile.photo" => Some(handle_photo(state, req)),
        "profile.editForm" => Some(handle_edit_form(state, req)),
        "profile.save" => Some(handle_save(state, req)),
        _ => None,
    }
}
