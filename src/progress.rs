use crate::achievement::{Achievement, AchievementResolver, DEFAULT_THRESHOLD_PERCENT};
use crate::coverage::{aggregate, IntervalMapper, JuzCoverage};
use crate::normalize::{RangeNormalizer, SkippedEntry};
use crate::quran::{JuzNumber, QuranIndex};
use crate::records::{DateWindow, MemorizationRecord, RecordStore};
use crate::surah_names::NameResolver;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ProgressError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ProgressError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSettings {
    pub threshold_percent: f64,
    pub completion_percent: f64,
    pub dashboard_limit: usize,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
            completion_percent: 100.0,
            dashboard_limit: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSnapshot {
    pub total_juz_equivalent: f64,
    pub per_juz: Vec<JuzCoverage>,
    pub highest_juz_achieved: JuzNumber,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub snapshot: CoverageSnapshot,
    pub achievement: Achievement,
    pub unique_juzs: Vec<JuzNumber>,
    pub completed_juz_count: usize,
    pub dashboard: Vec<JuzCoverage>,
    pub skipped: Vec<SkippedEntry>,
}

/// Pure pipeline from a student's records to a coverage snapshot:
/// normalize -> project onto Juz -> merge -> aggregate -> resolve achievement.
pub struct ProgressEngine<'a> {
    quran: &'a QuranIndex,
    names: &'a NameResolver,
    settings: ProgressSettings,
}

impl<'a> ProgressEngine<'a> {
    pub fn new(quran: &'a QuranIndex, names: &'a NameResolver, settings: ProgressSettings) -> Self {
        Self {
            quran,
            names,
            settings,
        }
    }

    pub fn compute(&self, records: &[MemorizationRecord]) -> ProgressReport {
        let normalized = RangeNormalizer::new(self.quran, self.names).normalize_all(records);
        let intervals = IntervalMapper::new(self.quran).project_all(&normalized.tuples);
        let totals = aggregate(self.quran, &intervals);
        let achievement =
            AchievementResolver::new(self.settings.threshold_percent).resolve(records, &totals.per_juz);

        tracing::debug!(
            records = records.len(),
            ranges = normalized.tuples.len(),
            skipped = normalized.skipped.len(),
            total_juz = totals.total_juz_equivalent,
            achievement = ?achievement,
            "computed coverage"
        );

        ProgressReport {
            unique_juzs: totals.unique_juzs(),
            completed_juz_count: totals.completed_count(self.settings.completion_percent),
            dashboard: totals.dashboard(self.settings.dashboard_limit),
            achievement,
            skipped: normalized.skipped,
            snapshot: CoverageSnapshot {
                total_juz_equivalent: totals.total_juz_equivalent,
                per_juz: totals.per_juz,
                highest_juz_achieved: achievement.juz(),
                record_count: records.len(),
            },
        }
    }

    pub fn compute_for_student<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        student_id: &str,
        window: &DateWindow,
    ) -> Result<ProgressReport, ProgressError> {
        let exists = store
            .student_exists(student_id)
            .map_err(|e| ProgressError::new("db_query_failed", e.to_string()))?;
        if !exists {
            return Err(ProgressError::new("not_found", "student not found"));
        }
        let records = store
            .memorization_records(student_id, window)
            .map_err(|e| ProgressError::new("db_query_failed", e.to_string()))?;
        let report = self.compute(&records);
        tracing::info!(
            student_id,
            records = report.snapshot.record_count,
            highest_juz = report.snapshot.highest_juz_achieved,
            "student progress computed"
        );
        Ok(report)
    }
}
