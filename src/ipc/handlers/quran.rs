use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::range_parse::{EntryParse, RangeParser};
use crate::surah_names::Resolution;
use serde_json::json;

fn handle_resolve_surah(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(name) = req.params.get("name").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing name", None);
    };
    match state.names.resolve(name) {
        Resolution::Resolved { number, matched } => {
            let canonical = state.quran.surah(number).map(|s| s.canonical_name);
            ok(
                &req.id,
                json!({
                    "resolved": true,
                    "surahNumber": number,
                    "canonicalName": canonical,
                    "matched": matched,
                }),
            )
        }
        Resolution::Unresolved => ok(&req.id, json!({ "resolved": false })),
    }
}

fn handle_parse_range(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(text) = req.params.get("text").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing text", None);
    };
    let parser = RangeParser::new(&state.names);
    let mut entries = Vec::new();
    let mut unresolved = Vec::new();
    for parsed in parser.parse_entries(text) {
        match parsed {
            EntryParse::Resolved(entry) => entries.push(entry),
            EntryParse::Unresolved { entry } => unresolved.push(entry),
        }
    }
    ok(
        &req.id,
        json!({ "entries": entries, "unresolved": unresolved }),
    )
}

fn param_u16(req: &Request, key: &str) -> Result<Option<u16>, String> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| format!("{} must be a positive integer", key)),
    }
}

fn handle_locate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(surah) = req
        .params
        .get("surah")
        .and_then(|v| v.as_u64())
        .and_then(|n| u8::try_from(n).ok())
    else {
        return err(&req.id, "bad_params", "surah must be an integer", None);
    };
    let (ayah, ayah_end) = match (param_u16(req, "ayah"), param_u16(req, "ayahEnd")) {
        (Ok(Some(a)), Ok(end)) => (a, end),
        (Ok(None), _) => return err(&req.id, "bad_params", "missing ayah", None),
        (Err(msg), _) | (_, Err(msg)) => return err(&req.id, "bad_params", msg, None),
    };

    let juz = state.quran.locate(surah, ayah);
    let total_ayah = juz.and_then(|j| state.quran.juz(j)).map(|b| b.total_ayah());
    let mut result = json!({ "juz": juz, "juzTotalAyah": total_ayah });
    if let Some(end) = ayah_end {
        result["juzSpan"] = json!(state.quran.juz_span(surah, ayah, end));
    }
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "quran.resolveSurah" => Some(handle_resolve_surah(state, req)),
        "quran.parseRange" => Some(handle_parse_range(state, req)),
        "quran.locate" => Some(handle_locate(state, req)),
        _ => None,
    }
}
