use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::progress::ProgressSettings;
use serde_json::{json, Map, Value};

#[derive(Clone, Copy)]
enum SetupSection {
    Progress,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "progress" => Some(Self::Progress),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Progress => "setup.progress",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Progress => {
            serde_json::to_value(ProgressSettings::default()).unwrap_or_else(|_| json!({}))
        }
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

/// Percent in the half-open range (0, 100].
fn parse_percent(v: &Value, key: &str) -> Result<f64, String> {
    let n = v
        .as_f64()
        .ok_or_else(|| format!("{} must be a number", key))?;
    if !(n > 0.0 && n <= 100.0) {
        return Err(format!("{} must be in (0, 100]", key));
    }
    Ok(n)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::Progress => match k.as_str() {
                "thresholdPercent" | "completionPercent" => {
                    obj.insert(k.clone(), Value::from(parse_percent(v, k)?));
                }
                "dashboardLimit" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 1, 30)?));
                }
                _ => return Err(format!("unknown progress field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &rusqlite::Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Best-effort apply: a bad historical value falls back to its default.
            if let Err(msg) = merge_section_patch(section, &mut current, saved_obj) {
                tracing::warn!(key = section.key(), error = %msg, "ignoring invalid saved setting");
                current = default_section(section);
            }
        }
    }
    Ok(current)
}

/// Effective progress settings for the open workspace.
pub fn load_progress_settings(conn: &rusqlite::Connection) -> anyhow::Result<ProgressSettings> {
    let section = load_section(conn, SetupSection::Progress)?;
    Ok(serde_json::from_value(section)?)
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let progress = match load_section(conn, SetupSection::Progress) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    ok(&req.id, json!({ "progress": progress }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    tracing::info!(key = section.key(), "settings updated");
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Value {
        default_section(SetupSection::Progress)
    }

    #[test]
    fn defaults_match_engine_defaults() {
        let v = defaults();
        assert_eq!(v["thresholdPercent"], json!(30.0));
        assert_eq!(v["completionPercent"], json!(100.0));
        assert_eq!(v["dashboardLimit"], json!(5));
    }

    #[test]
    fn patch_validation() {
        let mut v = defaults();
        let patch = json!({ "thresholdPercent": 80, "dashboardLimit": 10 });
        merge_section_patch(SetupSection::Progress, &mut v, patch.as_object().expect("obj"))
            .expect("valid patch");
        let settings: ProgressSettings = serde_json::from_value(v.clone()).expect("settings");
        assert_eq!(settings.threshold_percent, 80.0);
        assert_eq!(settings.dashboard_limit, 10);

        for bad in [
            json!({ "thresholdPercent": 0 }),
            json!({ "completionPercent": 100.5 }),
            json!({ "dashboardLimit": 0 }),
            json!({ "dashboardLimit": 2.5 }),
            json!({ "targetJuz": 3 }),
        ] {
            let mut v = defaults();
            assert!(
                merge_section_patch(SetupSection::Progress, &mut v, bad.as_object().expect("obj"))
                    .is_err(),
                "{} should be rejected",
                bad
            );
        }
    }
}
