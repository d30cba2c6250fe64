use crate::coverage::JuzCoverage;
use crate::quran::{JuzNumber, JUZ_COUNT};
use crate::records::MemorizationRecord;
use serde::Serialize;

pub const DEFAULT_THRESHOLD_PERCENT: f64 = 30.0;

/// How the highest Juz was decided. Manually entered Juz values always win;
/// the coverage threshold is consulted only when there are none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "strategy", content = "juz")]
pub enum Achievement {
    DirectAssignment(JuzNumber),
    ThresholdFallback(JuzNumber),
}

impl Achievement {
    pub fn juz(self) -> JuzNumber {
        match self {
            Achievement::DirectAssignment(j) | Achievement::ThresholdFallback(j) => j,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AchievementResolver {
    threshold_percent: f64,
}

impl Default for AchievementResolver {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_PERCENT)
    }
}

impl AchievementResolver {
    pub fn new(threshold_percent: f64) -> Self {
        Self { threshold_percent }
    }

    pub fn resolve(&self, records: &[MemorizationRecord], per_juz: &[JuzCoverage]) -> Achievement {
        match direct_assignment(records) {
            Some(juz) => Achievement::DirectAssignment(juz),
            None => Achievement::ThresholdFallback(self.threshold_juz(per_juz)),
        }
    }

    fn threshold_juz(&self, per_juz: &[JuzCoverage]) -> JuzNumber {
        per_juz
            .iter()
            .filter(|c| c.covered_ayah > 0 && c.percent >= self.threshold_percent)
            .map(|c| c.juz)
            .max()
            .unwrap_or(0)
    }
}

/// Highest manually entered Juz, clamped to 1..=30. Non-positive values mean
/// "not assigned" and are ignored.
fn direct_assignment(records: &[MemorizationRecord]) -> Option<JuzNumber> {
    let mut best: Option<i64> = None;
    for r in records {
        let Some(juz) = r.direct_juz else {
            continue;
        };
        if juz <= 0 {
            tracing::warn!(
                student_id = %r.student_id,
                record_id = %r.id,
                juz,
                "ignoring non-positive direct juz"
            );
            continue;
        }
        best = Some(best.map_or(juz, |b| b.max(juz)));
    }
    best.map(|j| j.clamp(1, JUZ_COUNT as i64) as JuzNumber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage(percents: &[(JuzNumber, f64)]) -> Vec<JuzCoverage> {
        (1..=JUZ_COUNT as JuzNumber)
            .map(|juz| {
                let percent = percents
                    .iter()
                    .find(|(j, _)| *j == juz)
                    .map(|(_, p)| *p)
                    .unwrap_or(0.0);
                JuzCoverage {
                    juz,
                    covered_ayah: percent.ceil() as u32,
                    total_ayah: 100,
                    percent,
                }
            })
            .collect()
    }

    fn with_direct(juz: Option<i64>) -> MemorizationRecord {
        MemorizationRecord {
            id: "h".to_string(),
            student_id: "s".to_string(),
            direct_juz: juz,
            ..Default::default()
        }
    }

    #[test]
    fn threshold_fallback_picks_highest_qualifying_juz() {
        let r = AchievementResolver::default();
        let cov = coverage(&[(1, 100.0), (2, 30.0), (3, 29.9), (30, 12.0)]);
        assert_eq!(r.resolve(&[], &cov), Achievement::ThresholdFallback(2));
    }

    #[test]
    fn threshold_fallback_is_zero_when_nothing_qualifies() {
        let r = AchievementResolver::default();
        let cov = coverage(&[(5, 10.0)]);
        assert_eq!(r.resolve(&[with_direct(None)], &cov), Achievement::ThresholdFallback(0));
    }

    #[test]
    fn direct_assignment_always_wins() {
        let r = AchievementResolver::default();
        let cov = coverage(&[(10, 100.0), (12, 90.0)]);
        let records = [with_direct(Some(2)), with_direct(None), with_direct(Some(4))];
        assert_eq!(r.resolve(&records, &cov), Achievement::DirectAssignment(4));

        // Even when coverage would credit nothing at all.
        let empty = coverage(&[]);
        assert_eq!(
            r.resolve(&[with_direct(Some(1))], &empty),
            Achievement::DirectAssignment(1)
        );
    }

    #[test]
    fn direct_values_are_clamped_and_zero_ignored() {
        let r = AchievementResolver::default();
        let cov = coverage(&[(3, 50.0)]);
        assert_eq!(
            r.resolve(&[with_direct(Some(45))], &cov),
            Achievement::DirectAssignment(30)
        );
        assert_eq!(
            r.resolve(&[with_direct(Some(0)), with_direct(Some(-2))], &cov),
            Achievement::ThresholdFallback(3)
        );
    }

    #[test]
    fn configurable_threshold() {
        let strict = AchievementResolver::new(80.0);
        let cov = coverage(&[(1, 85.0), (2, 79.0)]);
        assert_eq!(strict.resolve(&[], &cov).juz(), 1);
    }
}
