use crate::normalize::CanonicalRange;
use crate::quran::{JuzNumber, QuranIndex, JUZ_COUNT};
use serde::Serialize;

/// Inclusive `[start, end]` in a Juz's 1-based relative ayah coordinates.
pub type Interval = (u32, u32);

pub struct IntervalMapper<'a> {
    quran: &'a QuranIndex,
}

impl<'a> IntervalMapper<'a> {
    pub fn new(quran: &'a QuranIndex) -> Self {
        Self { quran }
    }

    /// Every `(juz, interval)` the range intersects. A range crossing a Juz
    /// boundary yields one entry per Juz.
    pub fn project(&self, range: &CanonicalRange) -> Vec<(JuzNumber, Interval)> {
        let mut out = Vec::new();
        for boundary in self.quran.juz_boundaries() {
            for seg in boundary.segments.iter().filter(|s| s.surah == range.surah) {
                let overlap_start = range.ayah_start.max(seg.from_ayah);
                let overlap_end = range.ayah_end.min(seg.to_ayah);
                if overlap_start > overlap_end {
                    continue;
                }
                let base = seg.cumulative_offset + 1;
                let rel_start = base + u32::from(overlap_start - seg.from_ayah);
                let rel_end = base + u32::from(overlap_end - seg.from_ayah);
                out.push((boundary.juz_number, (rel_start, rel_end)));
            }
        }
        out
    }

    /// Interval lists indexed by `juz - 1`; always `JUZ_COUNT` long.
    pub fn project_all(&self, ranges: &[CanonicalRange]) -> Vec<Vec<Interval>> {
        let mut per_juz: Vec<Vec<Interval>> = vec![Vec::new(); JUZ_COUNT];
        for range in ranges {
            for (juz, interval) in self.project(range) {
                if let Some(list) = per_juz.get_mut(usize::from(juz) - 1) {
                    list.push(interval);
                }
            }
        }
        per_juz
    }
}

/// Sorts and merges overlapping or touching intervals (`next.start <= end + 1`).
pub fn merge_intervals(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_unstable();
    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        match merged.last_mut() {
            Some(current) if start <= current.1.saturating_add(1) => {
                current.1 = current.1.max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Unique ayat covered by the intervals.
pub fn covered_ayah(intervals: &[Interval]) -> u32 {
    merge_intervals(intervals)
        .iter()
        .map(|(start, end)| end - start + 1)
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JuzCoverage {
    pub juz: JuzNumber,
    pub covered_ayah: u32,
    pub total_ayah: u32,
    pub percent: f64,
}

impl JuzCoverage {
    fn fraction(&self) -> f64 {
        if self.total_ayah == 0 {
            0.0
        } else {
            f64::from(self.covered_ayah) / f64::from(self.total_ayah)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageTotals {
    pub total_juz_equivalent: f64,
    pub per_juz: Vec<JuzCoverage>,
}

impl CoverageTotals {
    pub fn unique_juzs(&self) -> Vec<JuzNumber> {
        self.per_juz
            .iter()
            .filter(|c| c.covered_ayah > 0)
            .map(|c| c.juz)
            .collect()
    }

    pub fn completed_count(&self, completion_percent: f64) -> usize {
        self.per_juz
            .iter()
            .filter(|c| c.covered_ayah > 0 && c.percent >= completion_percent)
            .count()
    }

    /// Juz with any progress, most complete first; ties go to the lower Juz.
    /// Filtering and ordering use the displayed percent (one decimal).
    pub fn dashboard(&self, limit: usize) -> Vec<JuzCoverage> {
        let shown = |c: &JuzCoverage| round_to(c.percent, 1);
        let mut rows: Vec<JuzCoverage> = self
            .per_juz
            .iter()
            .filter(|c| shown(c) > 0.0)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            shown(b)
                .partial_cmp(&shown(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.juz.cmp(&b.juz))
        });
        rows.truncate(limit);
        rows
    }
}

pub fn aggregate(quran: &QuranIndex, per_juz_intervals: &[Vec<Interval>]) -> CoverageTotals {
    let per_juz: Vec<JuzCoverage> = quran
        .juz_boundaries()
        .iter()
        .map(|boundary| {
            let idx = usize::from(boundary.juz_number) - 1;
            let intervals = per_juz_intervals
                .get(idx)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let total_ayah = boundary.total_ayah();
            let covered = covered_ayah(intervals).min(total_ayah);
            let percent = if total_ayah > 0 {
                100.0 * f64::from(covered) / f64::from(total_ayah)
            } else {
                0.0
            };
            JuzCoverage {
                juz: boundary.juz_number,
                covered_ayah: covered,
                total_ayah,
                percent,
            }
        })
        .collect();
    let total_juz_equivalent = per_juz.iter().map(JuzCoverage::fraction).sum();
    CoverageTotals {
        total_juz_equivalent,
        per_juz,
    }
}

pub fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (x * factor).round() / factor
}
