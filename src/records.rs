use crate::quran::JuzNumber;
use chrono::NaiveDate;
use serde::Serialize;

/// One hafalan submission as the record store holds it. Numeric fields are
/// kept raw so that validation happens in one place (the normalizer).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorizationRecord {
    pub id: String,
    pub student_id: String,
    pub surah_number: Option<i64>,
    pub surah_text: Option<String>,
    pub ayah_start: Option<i64>,
    pub ayah_end: Option<i64>,
    pub direct_juz: Option<i64>,
    pub additional: Vec<AdditionalRange>,
    /// The stored additional-range payload could not be decoded.
    pub additional_malformed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalRange {
    pub surah_number: Option<i64>,
    pub surah_text: Option<String>,
    pub ayah_start: Option<i64>,
    pub ayah_end: Option<i64>,
}

/// Decodes the stored JSON array of additional surahs. Items use the keys
/// `surahNumber`, `surah`, `ayatMulai`, `ayatSelesai`; numbers may be stored
/// as strings.
pub fn decode_additional_ranges(raw: &str) -> anyhow::Result<Vec<AdditionalRange>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let value: serde_json::Value = serde_json::from_str(trimmed)?;
    if value.is_null() {
        return Ok(Vec::new());
    }
    let Some(items) = value.as_array() else {
        anyhow::bail!("additional surahs must be a JSON array");
    };
    Ok(items
        .iter()
        .filter_map(|item| item.as_object())
        .map(|obj| AdditionalRange {
            surah_number: obj.get("surahNumber").and_then(lenient_int),
            surah_text: obj
                .get("surah")
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            ayah_start: obj.get("ayatMulai").and_then(lenient_int),
            ayah_end: obj.get("ayatSelesai").and_then(lenient_int),
        })
        .collect())
}

/// The one integer coercion for stored numbers: integers, whole floats and
/// numeric strings (surrounding whitespace allowed). Anything else is absent.
pub(crate) fn lenient_int(v: &serde_json::Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    if let Some(f) = v.as_f64() {
        return (f.fract() == 0.0).then_some(f as i64);
    }
    v.as_str().and_then(|s| s.trim().parse::<i64>().ok())
}

/// Inclusive date window used to scope records to a school year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, String> {
        let parse_one = |key: &str, raw: Option<&str>| -> Result<Option<NaiveDate>, String> {
            match raw.map(str::trim).filter(|s| !s.is_empty()) {
                None => Ok(None),
                Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|_| format!("{} must be a YYYY-MM-DD date", key)),
            }
        };
        let window = Self {
            from: parse_one("from", from)?,
            to: parse_one("to", to)?,
        };
        if let (Some(f), Some(t)) = (window.from, window.to) {
            if f > t {
                return Err("from must not be after to".to_string());
            }
        }
        Ok(window)
    }
}

/// Read path to the hafalan records of one student.
pub trait RecordStore {
    fn student_exists(&self, student_id: &str) -> anyhow::Result<bool>;

    fn memorization_records(
        &self,
        student_id: &str,
        window: &DateWindow,
    ) -> anyhow::Result<Vec<MemorizationRecord>>;
}

/// Write path for the cached achievement scalar on the student entity.
pub trait ProgressStore {
    /// Overwrites the cached value; returns false when the student is unknown.
    fn write_highest_juz(&self, student_id: &str, highest: JuzNumber) -> anyhow::Result<bool>;
}
