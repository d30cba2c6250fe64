use crate::quran::{SurahNumber, SURAH_COUNT};
use crate::surah_names::NameResolver;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

// Attempted in order; the first pattern that matches an entry decides its shape.
static RANGED_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)\.\s*)?(.+?)\s*\(?\s*(\d+)\s*[-\u{2013}\u{2014}]\s*(\d+)\s*\)?$")
        .expect("ranged entry pattern")
});
static NAME_ONLY_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(\d+)\.\s*)?(.+?)$").expect("name-only entry pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SurahSource {
    Dictionary,
    Ordinal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEntry {
    pub surah_number: SurahNumber,
    pub surah_name: String,
    pub ayah_start: Option<u16>,
    pub ayah_end: Option<u16>,
    pub source: SurahSource,
}

impl ParsedEntry {
    pub fn range(&self) -> Option<(u16, u16)> {
        Some((self.ayah_start?, self.ayah_end?))
    }
}

#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryParse {
    Resolved(ParsedEntry),
    Unresolved { entry: String },
}

/// Splits on commas that are not inside parentheses.
pub fn split_entries(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0_usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(text[start..].trim());
    out.retain(|e| !e.is_empty());
    out
}

#[derive(Debug, Clone, Copy)]
pub struct RangeParser<'a> {
    names: &'a NameResolver,
}

impl<'a> RangeParser<'a> {
    pub fn new(names: &'a NameResolver) -> Self {
        Self { names }
    }

    /// Resolved entries only; malformed or unknown entries are dropped.
    pub fn parse(&self, text: &str) -> Vec<ParsedEntry> {
        self.parse_entries(text)
            .into_iter()
            .filter_map(|p| match p {
                EntryParse::Resolved(entry) => Some(entry),
                EntryParse::Unresolved { entry } => {
                    tracing::debug!(entry = %entry, "dropping unresolved surah entry");
                    None
                }
            })
            .collect()
    }

    pub fn parse_entries(&self, text: &str) -> Vec<EntryParse> {
        split_entries(text)
            .into_iter()
            .map(|entry| self.parse_entry(entry))
            .collect()
    }

    pub fn parse_entry(&self, entry: &str) -> EntryParse {
        let unresolved = || EntryParse::Unresolved {
            entry: entry.to_string(),
        };

        if let Some(caps) = RANGED_ENTRY.captures(entry) {
            let (Some(start), Some(end)) = (number_at(&caps, 3), number_at(&caps, 4)) else {
                return unresolved();
            };
            return match self.identify(&caps) {
                Some((surah_number, surah_name, source)) => EntryParse::Resolved(ParsedEntry {
                    surah_number,
                    surah_name,
                    ayah_start: Some(start),
                    ayah_end: Some(end),
                    source,
                }),
                None => unresolved(),
            };
        }

        if let Some(caps) = NAME_ONLY_ENTRY.captures(entry) {
            if let Some((surah_number, surah_name, source)) = self.identify(&caps) {
                return EntryParse::Resolved(ParsedEntry {
                    surah_number,
                    surah_name,
                    ayah_start: None,
                    ayah_end: None,
                    source,
                });
            }
        }
        unresolved()
    }

    fn identify(&self, caps: &Captures<'_>) -> Option<(SurahNumber, String, SurahSource)> {
        let name = caps.get(2)?.as_str().trim().to_string();
        if let Some(number) = self.names.resolve(&name).number() {
            return Some((number, name, SurahSource::Dictionary));
        }
        let ordinal = number_at(caps, 1)?;
        if ordinal == 0 || usize::from(ordinal) > SURAH_COUNT {
            return None;
        }
        Some((ordinal as SurahNumber, name, SurahSource::Ordinal))
    }
}

fn number_at(caps: &Captures<'_>, idx: usize) -> Option<u16> {
    caps.get(idx)?.as_str().parse::<u16>().ok()
}
