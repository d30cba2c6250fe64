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

fn seed(workspace: &std::path::Path) {
    let conn = rusqlite::Connection::open(workspace.join("hafalan.sqlite3")).expect("open db");
    conn.execute_batch(
        r#"
        INSERT INTO classes(id, name) VALUES('c1', 'Tahfidz D');
        INSERT INTO students(id, class_id, name) VALUES('s1', 'c1', 'Hafsah');
        INSERT INTO hafalan(id, student_id, tanggal, surah_number, ayat_mulai, ayat_selesai)
            VALUES('h1', 's1', '2024-11-01', 1, 1, 7);
        INSERT INTO hafalan(id, student_id, tanggal, surah_number, ayat_mulai, ayat_selesai)
            VALUES('h2', 's1', '2024-11-02', 2, 1, 67);
        INSERT INTO hafalan(id, student_id, tanggal, surah_number, ayat_mulai, ayat_selesai)
            VALUES('h3', 's1', '2024-11-03', 67, 1, 30);
        "#,
    )
    .expect("seed");
}

#[test]
fn progress_settings_defaults_and_validation() {
    let workspace = temp_dir("hafaland-setup-progress");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let setup = request_ok(&mut stdin, &mut reader, "2", "setup.get", json!({}));
    assert_eq!(setup["progress"]["thresholdPercent"].as_f64(), Some(30.0));
    assert_eq!(setup["progress"]["completionPercent"].as_f64(), Some(100.0));
    assert_eq!(setup["progress"]["dashboardLimit"].as_i64(), Some(5));

    for (i, (section, patch)) in [
        ("progress", json!({ "thresholdPercent": 0 })),
        ("progress", json!({ "thresholdPercent": 150 })),
        ("progress", json!({ "dashboardLimit": 31 })),
        ("progress", json!({ "unknownField": true })),
        ("grading", json!({ "thresholdPercent": 50 })),
    ]
    .into_iter()
    .enumerate()
    {
        let id = format!("bad{}", i);
        let resp = request(
            &mut stdin,
            &mut reader,
            &id,
            "setup.update",
            json!({ "section": section, "patch": patch }),
        );
        assert_eq!(error_code(&resp), Some("bad_params"), "{} {}", section, patch);
    }

    let resp = request(
        &mut stdin,
        &mut reader,
        "nopatch",
        "setup.update",
        json!({ "section": "progress" }),
    );
    assert_eq!(error_code(&resp), Some("bad_params"));

    // Rejected patches leave the stored section untouched.
    let setup = request_ok(&mut stdin, &mut reader, "3", "setup.get", json!({}));
    assert_eq!(setup["progress"]["thresholdPercent"].as_f64(), Some(30.0));
}

#[test]
fn progress_settings_drive_computation() {
    let workspace = temp_dir("hafaland-setup-applied");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    seed(&workspace);

    // Juz 1 at 50%, Juz 29 at 30/431.
    let baseline = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "progress.compute",
        json!({ "studentId": "s1" }),
    );
    assert_eq!(baseline["snapshot"]["highestJuzAchieved"].as_u64(), Some(1));
    assert_eq!(baseline["completedJuzCount"].as_u64(), Some(0));
    assert_eq!(baseline["dashboard"].as_array().map(|a| a.len()), Some(2));

    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "setup.update",
        json!({
            "section": "progress",
            "patch": { "thresholdPercent": 80, "completionPercent": 50, "dashboardLimit": 1 }
        }),
    );

    let strict = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "progress.compute",
        json!({ "studentId": "s1" }),
    );
    assert_eq!(strict["snapshot"]["highestJuzAchieved"].as_u64(), Some(0));
    assert_eq!(strict["completedJuzCount"].as_u64(), Some(1));
    let dashboard = strict["dashboard"].as_array().expect("dashboard");
    assert_eq!(dashboard.len(), 1);
    assert_eq!(dashboard[0]["juz"].as_u64(), Some(1));

    // Coverage numbers do not depend on the settings.
    assert_eq!(strict["snapshot"]["perJuz"], baseline["snapshot"]["perJuz"]);
}

#[test]
fn progress_settings_persist_across_restarts() {
    let workspace = temp_dir("hafaland-setup-persist");
    {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "setup.update",
            json!({ "section": "progress", "patch": { "thresholdPercent": 45.5 } }),
        );
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let setup = request_ok(&mut stdin, &mut reader, "2", "setup.get", json!({}));
    assert_eq!(setup["progress"]["thresholdPercent"].as_f64(), Some(45.5));
    assert_eq!(setup["progress"]["dashboardLimit"].as_i64(), Some(5));
}
