use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_hafaland");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn hafaland");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str())
}

#[test]
fn resolve_surah_accepts_spelling_variants() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let exact = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "quran.resolveSurah",
        json!({ "name": "Al-Baqarah" }),
    );
    assert_eq!(exact["resolved"].as_bool(), Some(true));
    assert_eq!(exact["surahNumber"].as_u64(), Some(2));
    assert_eq!(exact["matched"].as_str(), Some("exact"));

    let loose = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "quran.resolveSurah",
        json!({ "name": "  ali imran " }),
    );
    assert_eq!(loose["surahNumber"].as_u64(), Some(3));
    assert_eq!(loose["canonicalName"].as_str(), Some("Ali 'Imran"));

    let unknown = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "quran.resolveSurah",
        json!({ "name": "Surah Misteri" }),
    );
    assert_eq!(unknown["resolved"].as_bool(), Some(false));
    assert!(unknown.get("surahNumber").is_none());

    let resp = request(&mut stdin, &mut reader, "4", "quran.resolveSurah", json!({}));
    assert_eq!(error_code(&resp), Some("bad_params"));
}

#[test]
fn parse_range_handles_parenthesized_and_multi_entry_text() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let single = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "quran.parseRange",
        json!({ "text": "Ali Imran (1-198)" }),
    );
    let entries = single["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["surahNumber"].as_u64(), Some(3));
    assert_eq!(entries[0]["ayahStart"].as_u64(), Some(1));
    assert_eq!(entries[0]["ayahEnd"].as_u64(), Some(198));

    let multi = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "quran.parseRange",
        json!({ "text": "An-Naba 1-40, Surah Misteri 1-3, An-Naziat 1-46" }),
    );
    let entries = multi["entries"].as_array().expect("entries");
    let numbers: Vec<u64> = entries
        .iter()
        .filter_map(|e| e["surahNumber"].as_u64())
        .collect();
    assert_eq!(numbers, vec![78, 79]);
    assert_eq!(multi["unresolved"].as_array().map(|a| a.len()), Some(1));

    let ordinal = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "quran.parseRange",
        json!({ "text": "67. Tabarak 1-30" }),
    );
    let entries = ordinal["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["surahNumber"].as_u64(), Some(67));
    assert_eq!(entries[0]["source"].as_str(), Some("ordinal"));
}

#[test]
fn locate_finds_juz_and_span() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "quran.locate",
        json!({ "surah": 2, "ayah": 141 }),
    );
    assert_eq!(first, json!({ "juz": 1, "juzTotalAyah": 148 }));

    let second = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "quran.locate",
        json!({ "surah": 2, "ayah": 142 }),
    );
    assert_eq!(second["juz"].as_u64(), Some(2));

    let span = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "quran.locate",
        json!({ "surah": 2, "ayah": 1, "ayahEnd": 286 }),
    );
    assert_eq!(span["juz"].as_u64(), Some(1));
    assert_eq!(span["juzSpan"], json!([1, 2, 3]));

    let missing = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "quran.locate",
        json!({ "surah": 1, "ayah": 8 }),
    );
    assert!(missing["juz"].is_null());

    let resp = request(
        &mut stdin,
        &mut reader,
        "5",
        "quran.locate",
        json!({ "surah": "two", "ayah": 1 }),
    );
    assert_eq!(error_code(&resp), Some("bad_params"));

    let resp = request(&mut stdin, &mut reader, "6", "quran.locate", json!({ "surah": 2 }));
    assert_eq!(error_code(&resp), Some("bad_params"));
}
