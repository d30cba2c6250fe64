use crate::quran::{QuranIndex, SurahNumber};
use crate::range_parse::RangeParser;
use crate::records::MemorizationRecord;
use crate::surah_names::NameResolver;
use serde::Serialize;

/// A validated `surah:start-end` range with `1 <= start <= end <= ayahCount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRange {
    pub surah: SurahNumber,
    pub ayah_start: u16,
    pub ayah_end: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "index")]
pub enum EntryPart {
    Primary,
    Additional(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum SkipReason {
    MissingSurah,
    UnresolvedSurah { text: String },
    MissingAyah,
    InvertedRange { start: i64, end: i64 },
    OutOfBounds {
        surah: SurahNumber,
        start: i64,
        end: i64,
        ayah_count: u16,
    },
    MalformedAdditional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntry {
    pub record_id: String,
    pub part: EntryPart,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecords {
    pub tuples: Vec<CanonicalRange>,
    pub skipped: Vec<SkippedEntry>,
}

impl NormalizedRecords {
    fn extend(&mut self, other: NormalizedRecords) {
        self.tuples.extend(other.tuples);
        self.skipped.extend(other.skipped);
    }
}

/// The fields shared by the primary range and each additional range.
struct RangeFields<'r> {
    surah_number: Option<i64>,
    surah_text: Option<&'r str>,
    ayah_start: Option<i64>,
    ayah_end: Option<i64>,
}

pub struct RangeNormalizer<'a> {
    quran: &'a QuranIndex,
    parser: RangeParser<'a>,
}

impl<'a> RangeNormalizer<'a> {
    pub fn new(quran: &'a QuranIndex, names: &'a NameResolver) -> Self {
        Self {
            quran,
            parser: RangeParser::new(names),
        }
    }

    pub fn normalize_all(&self, records: &[MemorizationRecord]) -> NormalizedRecords {
        let mut out = NormalizedRecords::default();
        for record in records {
            out.extend(self.normalize_record(record));
        }
        out
    }

    /// Primary range first, then each additional range in stored order.
    pub fn normalize_record(&self, record: &MemorizationRecord) -> NormalizedRecords {
        let mut out = NormalizedRecords::default();

        let primary = RangeFields {
            surah_number: record.surah_number,
            surah_text: record.surah_text.as_deref(),
            ayah_start: record.ayah_start,
            ayah_end: record.ayah_end,
        };
        self.normalize_part(record, EntryPart::Primary, &primary, &mut out);

        if record.additional_malformed {
            self.skip(
                record,
                EntryPart::Additional(0),
                SkipReason::MalformedAdditional,
                &mut out,
            );
        }
        for (i, extra) in record.additional.iter().enumerate() {
            let fields = RangeFields {
                surah_number: extra.surah_number,
                surah_text: extra.surah_text.as_deref(),
                ayah_start: extra.ayah_start,
                ayah_end: extra.ayah_end,
            };
            self.normalize_part(record, EntryPart::Additional(i), &fields, &mut out);
        }
        out
    }

    fn normalize_part(
        &self,
        record: &MemorizationRecord,
        part: EntryPart,
        fields: &RangeFields<'_>,
        out: &mut NormalizedRecords,
    ) {
        let explicit = match (fields.ayah_start, fields.ayah_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        };
        let stored_any = fields.ayah_start.is_some() || fields.ayah_end.is_some();
        let numbered = fields
            .surah_number
            .filter(|&n| n >= 1 && n <= i64::from(u8::MAX))
            .map(|n| n as SurahNumber)
            .filter(|&n| self.quran.surah(n).is_some());
        let text = fields.surah_text.map(str::trim).filter(|t| !t.is_empty());

        match (numbered, explicit) {
            (Some(surah), Some((start, end))) => {
                self.push_checked(record, part, surah, start, end, out);
            }
            (Some(_), None) => self.skip(record, part, SkipReason::MissingAyah, out),
            (None, _) => {
                let Some(text) = text else {
                    self.skip(record, part, SkipReason::MissingSurah, out);
                    return;
                };
                let parsed = self.parser.parse(text);
                let Some(first) = parsed.first() else {
                    let reason = SkipReason::UnresolvedSurah {
                        text: text.to_string(),
                    };
                    self.skip(record, part, reason, out);
                    return;
                };
                if let Some((start, end)) = explicit {
                    // Stored ayah numbers outrank any range written in the text.
                    self.push_checked(record, part, first.surah_number, start, end, out);
                    return;
                }
                if stored_any {
                    // A half-stored pair is never completed from the text.
                    self.skip(record, part, SkipReason::MissingAyah, out);
                    return;
                }
                let mut any_ranged = false;
                for entry in &parsed {
                    if let Some((start, end)) = entry.range() {
                        any_ranged = true;
                        let (start, end) = (i64::from(start), i64::from(end));
                        self.push_checked(record, part, entry.surah_number, start, end, out);
                    }
                }
                if !any_ranged {
                    self.skip(record, part, SkipReason::MissingAyah, out);
                }
            }
        }
    }

    fn push_checked(
        &self,
        record: &MemorizationRecord,
        part: EntryPart,
        surah: SurahNumber,
        start: i64,
        end: i64,
        out: &mut NormalizedRecords,
    ) {
        let Some(info) = self.quran.surah(surah) else {
            self.skip(record, part, SkipReason::MissingSurah, out);
            return;
        };
        if start > end {
            self.skip(record, part, SkipReason::InvertedRange { start, end }, out);
            return;
        }
        if start < 1 || end > i64::from(info.ayah_count) {
            let reason = SkipReason::OutOfBounds {
                surah,
                start,
                end,
                ayah_count: info.ayah_count,
            };
            self.skip(record, part, reason, out);
            return;
        }
        out.tuples.push(CanonicalRange {
            surah,
            ayah_start: start as u16,
            ayah_end: end as u16,
        });
    }

    fn skip(
        &self,
        record: &MemorizationRecord,
        part: EntryPart,
        reason: SkipReason,
        out: &mut NormalizedRecords,
    ) {
        tracing::warn!(
            student_id = %record.student_id,
            record_id = %record.id,
            part = ?part,
            reason = ?reason,
            "skipping memorization entry"
        );
        out.skipped.push(SkippedEntry {
            record_id: record.id.clone(),
            part,
            reason,
        });
    }
}
