use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::quran::JUZ_COUNT;
use serde_json::json;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };

    // Correlated subquery so the count is not multiplied by joins.
    let mut stmt = match conn.prepare(
        "SELECT
           c.id,
           c.name,
           c.target_juz,
           (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS student_count
         FROM classes c
         ORDER BY c.name",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let rows = stmt
        .query_map([], |row| {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            let target_juz: Option<i64> = row.get(2)?;
            let student_count: i64 = row.get(3)?;
            Ok(json!({
                "id": id,
                "name": name,
                "targetJuz": target_juz,
                "studentCount": student_count
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(classes) => ok(&req.id, json!({ "classes": classes })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_classes_set_target(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(class_id) = req.params.get("classId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing classId", None);
    };
    let Some(target_juz) = req.params.get("targetJuz").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "targetJuz must be integer", None);
    };
    if !(1..=JUZ_COUNT as i64).contains(&target_juz) {
        return err(
            &req.id,
            "bad_params",
            format!("targetJuz must be in 1..={}", JUZ_COUNT),
            None,
        );
    }

    match db::set_class_target(conn, class_id, target_juz) {
        Ok(true) => {
            tracing::info!(class_id, target_juz, "class target updated");
            ok(&req.id, json!({ "ok": true }))
        }
        Ok(false) => err(&req.id, "not_found", "class not found", None),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.setTarget" => Some(handle_classes_set_target(state, req)),
        _ => None,
    }
}
