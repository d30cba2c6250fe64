use crate::quran::JuzNumber;
use crate::records::{
    self, decode_additional_ranges, DateWindow, MemorizationRecord, ProgressStore, RecordStore,
};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;

pub const DB_FILE_NAME: &str = "hafalan.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            target_juz INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            class_id TEXT,
            name TEXT NOT NULL,
            latest_juz_achieved INTEGER NOT NULL DEFAULT 0,
            progress_synced_at TEXT,
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_class ON students(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS hafalan(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            tanggal TEXT,
            surah_text TEXT,
            surah_number INTEGER,
            ayat_mulai INTEGER,
            ayat_selesai INTEGER,
            juz INTEGER,
            surah_tambahan TEXT,
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_hafalan_student ON hafalan(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    // Workspaces created before progress sync existed lack these columns.
    ensure_classes_target_juz(&conn)?;
    ensure_students_progress_columns(&conn)?;
    ensure_hafalan_surah_tambahan(&conn)?;

    Ok(conn)
}

fn ensure_classes_target_juz(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "classes", "target_juz")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE classes ADD COLUMN target_juz INTEGER", [])?;
    Ok(())
}

fn ensure_students_progress_columns(conn: &Connection) -> anyhow::Result<()> {
    if !table_has_column(conn, "students", "latest_juz_achieved")? {
        conn.execute(
            "ALTER TABLE students ADD COLUMN latest_juz_achieved INTEGER NOT NULL DEFAULT 0",
            [],
        )?;
    }
    if !table_has_column(conn, "students", "progress_synced_at")? {
        conn.execute("ALTER TABLE students ADD COLUMN progress_synced_at TEXT", [])?;
    }
    Ok(())
}

fn ensure_hafalan_surah_tambahan(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "hafalan", "surah_tambahan")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE hafalan ADD COLUMN surah_tambahan TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

pub fn class_exists(conn: &Connection, class_id: &str) -> anyhow::Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM classes WHERE id = ?", [class_id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

pub fn set_class_target(conn: &Connection, class_id: &str, target_juz: i64) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE classes SET target_juz = ? WHERE id = ?",
        (target_juz, class_id),
    )?;
    Ok(changed > 0)
}

pub fn class_student_ids(conn: &Connection, class_id: &str) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM students WHERE class_id = ? ORDER BY rowid")?;
    let ids = stmt
        .query_map([class_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Target Juz of the student's class. `None` when the student has no class
/// or the class has never been given a target.
pub fn student_class_target(conn: &Connection, student_id: &str) -> anyhow::Result<Option<i64>> {
    let target: Option<Option<i64>> = conn
        .query_row(
            "SELECT c.target_juz
             FROM students s
             LEFT JOIN classes c ON c.id = s.class_id
             WHERE s.id = ?",
            [student_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(target.flatten())
}

pub fn student_latest_juz(conn: &Connection, student_id: &str) -> anyhow::Result<Option<i64>> {
    let v = conn
        .query_row(
            "SELECT latest_juz_achieved FROM students WHERE id = ?",
            [student_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(v)
}

/// Reads an INTEGER, REAL or TEXT column through `records::lenient_int`.
fn lenient_int(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
    let v = match row.get::<_, SqlValue>(idx)? {
        SqlValue::Integer(n) => serde_json::Value::from(n),
        SqlValue::Real(f) => serde_json::Value::from(f),
        SqlValue::Text(s) => serde_json::Value::String(s),
        SqlValue::Null | SqlValue::Blob(_) => serde_json::Value::Null,
    };
    Ok(records::lenient_int(&v))
}

/// `RecordStore` and `ProgressStore` over an open workspace connection.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl RecordStore for SqliteStore<'_> {
    fn student_exists(&self, student_id: &str) -> anyhow::Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM students WHERE id = ?", [student_id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn memorization_records(
        &self,
        student_id: &str,
        window: &DateWindow,
    ) -> anyhow::Result<Vec<MemorizationRecord>> {
        let from = window.from.map(|d| d.format("%Y-%m-%d").to_string());
        let to = window.to.map(|d| d.format("%Y-%m-%d").to_string());
        let mut stmt = self.conn.prepare(
            "SELECT id, surah_text, surah_number, ayat_mulai, ayat_selesai, juz, surah_tambahan
             FROM hafalan
             WHERE student_id = ?1
               AND (?2 IS NULL OR substr(tanggal, 1, 10) >= ?2)
               AND (?3 IS NULL OR substr(tanggal, 1, 10) <= ?3)
             ORDER BY tanggal, rowid",
        )?;
        let rows = stmt
            .query_map((student_id, from, to), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    lenient_int(row, 2)?,
                    lenient_int(row, 3)?,
                    lenient_int(row, 4)?,
                    lenient_int(row, 5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Vec::with_capacity(rows.len());
        for (id, surah_text, surah_number, ayah_start, ayah_end, direct_juz, tambahan) in rows {
            let (additional, additional_malformed) = match tambahan.as_deref() {
                None => (Vec::new(), false),
                Some(raw) => match decode_additional_ranges(raw) {
                    Ok(list) => (list, false),
                    Err(e) => {
                        tracing::warn!(
                            student_id,
                            record_id = %id,
                            error = %e,
                            "malformed surah_tambahan; additional ranges ignored"
                        );
                        (Vec::new(), true)
                    }
                },
            };
            out.push(MemorizationRecord {
                id,
                student_id: student_id.to_string(),
                surah_number,
                surah_text,
                ayah_start,
                ayah_end,
                direct_juz,
                additional,
                additional_malformed,
            });
        }
        Ok(out)
    }
}

impl ProgressStore for SqliteStore<'_> {
    fn write_highest_juz(&self, student_id: &str, highest: JuzNumber) -> anyhow::Result<bool> {
        let synced_at = chrono::Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE students SET latest_juz_achieved = ?, progress_synced_at = ? WHERE id = ?",
            (i64::from(highest), synced_at, student_id),
        )?;
        Ok(changed > 0)
    }
}
