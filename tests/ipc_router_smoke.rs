mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{
    create_fixture_db, error_code, login, request, request_ok, spawn_sidecar, temp_dir,
    write_config,
};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let dir = temp_dir("hrportal-router-smoke");
    let db = create_fixture_db(&dir);
    let (_child, mut stdin, mut reader) = spawn_sidecar(&write_config(&dir, &db));

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));

    let _ = request_ok(&mut stdin, &mut reader, "2", "cache.invalidate", json!({}));
    let _ = request_ok(&mut stdin, &mut reader, "3", "session.loginOptions", json!({}));
    let sid = login(&mut stdin, &mut reader, "4", 1001, "4321");
    let _ = request_ok(&mut stdin, &mut reader, "5", "session.state", json!({ "sessionId": sid }));

    let calls = [
        ("view", "profile.view"),
        ("view", "profile.photo"),
        ("edit", "profile.editForm"),
        ("edit", "profile.save"),
        ("moreApps", "apps.list"),
    ];
    for (i, (page, method)) in calls.iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("sel-{}", i),
            "dashboard.select",
            json!({ "sessionId": sid, "page": page }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("call-{}", i),
            method,
            json!({ "sessionId": sid }),
        );
    }
    let _ = request_ok(&mut stdin, &mut reader, "6", "assets.stylesheet", json!({}));
    let _ = request_ok(&mut stdin, &mut reader, "7", "session.logout", json!({ "sessionId": sid }));

    let unknown = request(&mut stdin, &mut reader, "8", "classes.list", json!({}));
    assert_eq!(error_code(&unknown), "not_implemented");

    let missing = request(&mut stdin, &mut reader, "9", "session.state", json!({}));
    assert_eq!(error_code(&missing), "bad_params");
}

#[test]
fn malformed_lines_get_bad_json_and_the_loop_continues() {
    let dir = temp_dir("hrportal-router-badjson");
    let db = create_fixture_db(&dir);
    let (_child, mut stdin, mut reader) = spawn_sidecar(&write_config(&dir, &db));

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse");
    assert_eq!(value["ok"], false);
    assert_eq!(value["error"]["code"], "bad_json");

    let _ = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
}

#[test]
fn cache_invalidate_reports_whether_rows_were_loaded() {
    let dir = temp_dir("hrportal-router-cache");
    let db = create_fixture_db(&dir);
    let (_child, mut stdin, mut reader) = spawn_sidecar(&write_config(&dir, &db));

    let cold = request_ok(&mut stdin, &mut reader, "1", "cache.invalidate", json!({}));
    assert_eq!(cold["invalidated"], false);
    let _ = request_ok(&mut stdin, &mut reader, "2", "session.loginOptions", json!({}));
    let warm = request_ok(&mut stdin, &mut reader, "3", "cache.invalidate", json!({}));
    assert_eq!(warm["invalidated"], true);
}
