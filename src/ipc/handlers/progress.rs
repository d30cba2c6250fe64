use crate::coverage::{round_to, JuzCoverage};
use crate::db::{self, SqliteStore};
use crate::ipc::error::{err, ok, progress_err};
use crate::ipc::handlers::setup::load_progress_settings;
use crate::ipc::types::{AppState, Request};
use crate::progress::{ProgressEngine, ProgressError, ProgressReport};
use crate::records::DateWindow;
use crate::sync::sync_progress;
use crate::tasmi;
use serde_json::json;

fn coverage_json(c: &JuzCoverage) -> serde_json::Value {
    json!({
        "juz": c.juz,
        "coveredAyah": c.covered_ayah,
        "totalAyah": c.total_ayah,
        "percent": round_to(c.percent, 1),
    })
}

fn report_json(student_id: &str, report: &ProgressReport) -> serde_json::Value {
    let snapshot = &report.snapshot;
    json!({
        "studentId": student_id,
        "snapshot": {
            "totalJuzEquivalent": round_to(snapshot.total_juz_equivalent, 2),
            "perJuz": snapshot.per_juz.iter().map(coverage_json).collect::<Vec<_>>(),
            "highestJuzAchieved": snapshot.highest_juz_achieved,
            "recordCount": snapshot.record_count,
        },
        "achievement": report.achievement,
        "uniqueJuzs": report.unique_juzs,
        "completedJuzCount": report.completed_juz_count,
        "dashboard": report.dashboard.iter().map(coverage_json).collect::<Vec<_>>(),
        "skipped": report.skipped,
    })
}

fn student_id_param(req: &Request) -> Result<&str, serde_json::Value> {
    match req.params.get("studentId").and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(err(&req.id, "bad_params", "missing studentId", None)),
    }
}

fn window_param(req: &Request) -> Result<DateWindow, serde_json::Value> {
    let from = req.params.get("from").and_then(|v| v.as_str());
    let to = req.params.get("to").and_then(|v| v.as_str());
    DateWindow::parse(from, to).map_err(|msg| err(&req.id, "bad_params", msg, None))
}

/// Loads settings and runs the engine for one student against the open workspace.
fn compute_report(
    state: &AppState,
    conn: &rusqlite::Connection,
    student_id: &str,
    window: &DateWindow,
) -> Result<ProgressReport, ProgressError> {
    let settings = load_progress_settings(conn)
        .map_err(|e| ProgressError::new("db_query_failed", e.to_string()))?;
    let engine = ProgressEngine::new(&state.quran, &state.names, settings);
    engine.compute_for_student(&SqliteStore::new(conn), student_id, window)
}

fn handle_progress_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let student_id = match student_id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let window = match window_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let report = match compute_report(state, conn, student_id, &window) {
        Ok(r) => r,
        Err(e) => return progress_err(&req.id, e),
    };
    // Last value written by progress.sync, so callers can tell whether it is stale.
    let cached = match db::student_latest_juz(conn, student_id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let mut result = report_json(student_id, &report);
    result["cachedHighestJuz"] = json!(cached);
    ok(&req.id, result)
}

fn handle_progress_sync(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let student_id = match student_id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let window = match window_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let report = match compute_report(state, conn, student_id, &window) {
        Ok(r) => r,
        Err(e) => return progress_err(&req.id, e),
    };
    if let Err(e) = sync_progress(&SqliteStore::new(conn), student_id, &report.snapshot) {
        return progress_err(&req.id, e);
    }
    ok(
        &req.id,
        json!({
            "studentId": student_id,
            "highestJuzAchieved": report.snapshot.highest_juz_achieved,
            "achievement": report.achievement,
        }),
    )
}

fn handle_progress_sync_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(class_id) = req.params.get("classId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing classId", None);
    };
    match db::class_exists(conn, class_id) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "class not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }
    let student_ids = match db::class_student_ids(conn, class_id) {
        Ok(ids) => ids,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let store = SqliteStore::new(conn);
    let mut students = Vec::with_capacity(student_ids.len());
    let mut failed = Vec::new();
    // Each student is recomputed from its own full record set; one failure
    // does not stop the rest of the class.
    for student_id in &student_ids {
        let outcome = compute_report(state, conn, student_id, &DateWindow::default())
            .and_then(|report| {
                sync_progress(&store, student_id, &report.snapshot).map(|()| report)
            });
        match outcome {
            Ok(report) => students.push(json!({
                "studentId": student_id,
                "highestJuzAchieved": report.snapshot.highest_juz_achieved,
                "achievement": report.achievement,
            })),
            Err(e) => {
                tracing::warn!(
                    class_id,
                    student_id = %student_id,
                    code = %e.code,
                    error = %e.message,
                    "class sync failed for student"
                );
                failed.push(json!({
                    "studentId": student_id,
                    "code": e.code,
                    "message": e.message,
                }));
            }
        }
    }
    tracing::info!(
        class_id,
        synced = students.len(),
        failed = failed.len(),
        "class progress synced"
    );
    ok(
        &req.id,
        json!({ "classId": class_id, "students": students, "failed": failed }),
    )
}

fn handle_tasmi_eligibility(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let student_id = match student_id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let window = match window_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let target_override = match req.params.get("targetJuz") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => match v.as_i64() {
            Some(n) => Some(n),
            None => return err(&req.id, "bad_params", "targetJuz must be integer", None),
        },
    };

    let report = match compute_report(state, conn, student_id, &window) {
        Ok(r) => r,
        Err(e) => return progress_err(&req.id, e),
    };
    let target = match target_override {
        Some(t) => t,
        None => match db::student_class_target(conn, student_id) {
            Ok(t) => t.unwrap_or(0),
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        },
    };

    let achieved = i64::from(report.snapshot.highest_juz_achieved);
    let result = tasmi::evaluate(achieved, target);
    if target <= 0 {
        tracing::warn!(student_id, target, "tasmi target is not configured");
    }
    ok(
        &req.id,
        json!({
            "studentId": student_id,
            "isEligible": result.is_eligible,
            "remainingJuz": result.remaining_juz,
            "message": result.message,
            "highestJuzAchieved": achieved,
            "targetJuz": target,
            "achievement": report.achievement,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "progress.compute" => Some(handle_progress_compute(state, req)),
        "progress.sync" => Some(handle_progress_sync(state, req)),
        "progress.syncClass" => Some(handle_progress_sync_class(state, req)),
        "tasmi.eligibility" => Some(handle_tasmi_eligibility(state, req)),
        _ => None,
    }
}
