use crate::quran::{QuranIndex, SurahNumber};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchKind {
    Exact,
    Normalized,
}

/// Outcome of a surah name lookup. Unresolved names are an ordinary outcome,
/// never an error.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        number: SurahNumber,
        matched: MatchKind,
    },
    Unresolved,
}

impl Resolution {
    pub fn number(self) -> Option<SurahNumber> {
        match self {
            Resolution::Resolved { number, .. } => Some(number),
            Resolution::Unresolved => None,
        }
    }
}

/// "al baqarah" -> "Al-Baqarah": split on dashes and whitespace, title-case
/// each token, rejoin with dashes.
pub fn normalize_surah_name(raw: &str) -> String {
    raw.split(|c: char| c == '-' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join("-")
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars().map(fold_apostrophe);
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut out: String = first.to_uppercase().collect();
    for c in chars {
        out.extend(c.to_lowercase());
    }
    out
}

fn fold_apostrophe(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '`' | '\u{02BC}' => '\'',
        other => other,
    }
}

#[derive(Debug, Clone)]
pub struct NameResolver {
    exact: HashMap<&'static str, SurahNumber>,
    normalized: HashMap<String, SurahNumber>,
}

impl NameResolver {
    pub fn new(quran: &QuranIndex) -> Self {
        let mut exact = HashMap::new();
        let mut normalized = HashMap::new();
        for surah in quran.surahs() {
            let names = std::iter::once(surah.canonical_name)
                .chain(surah.name_variants.iter().copied());
            for name in names {
                exact.insert(name, surah.number);
                normalized.insert(normalize_surah_name(name), surah.number);
            }
        }
        Self { exact, normalized }
    }

    pub fn resolve(&self, raw: &str) -> Resolution {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Resolution::Unresolved;
        }
        if let Some(&number) = self.exact.get(trimmed) {
            return Resolution::Resolved {
                number,
                matched: MatchKind::Exact,
            };
        }
        match self.normalized.get(&normalize_surah_name(trimmed)) {
            Some(&number) => Resolution::Resolved {
                number,
                matched: MatchKind::Normalized,
            },
            None => Resolution::Unresolved,
        }
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }
}
