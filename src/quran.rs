use thiserror::Error;

pub type SurahNumber = u8;
pub type JuzNumber = u8;

pub const SURAH_COUNT: usize = 114;
pub const JUZ_COUNT: usize = 30;
pub const TOTAL_AYAT: u32 = 6236;

/// (canonical name, ayah count, accepted alternate spellings), indexed by surah number - 1.
const SURAH_TABLE: [(&str, u16, &[&str]); SURAH_COUNT] = [
    ("Al-Fatihah", 7, &["Al-Fatiha"]),
    ("Al-Baqarah", 286, &[]),
    ("Ali 'Imran", 200, &["Ali Imran"]),
    ("An-Nisa", 176, &["An-Nisa'"]),
    ("Al-Ma'idah", 120, &["Al-Maidah"]),
    ("Al-An'am", 165, &["Al-Anam"]),
    ("Al-A'raf", 206, &["Al-Araf"]),
    ("Al-Anfal", 75, &[]),
    ("At-Taubah", 129, &["At-Tawbah"]),
    ("Yunus", 109, &[]),
    ("Hud", 123, &[]),
    ("Yusuf", 111, &[]),
    ("Ar-Ra'd", 43, &["Ar-Rad"]),
    ("Ibrahim", 52, &[]),
    ("Al-Hijr", 99, &[]),
    ("An-Nahl", 128, &[]),
    ("Al-Isra", 111, &["Al-Isra'"]),
    ("Al-Kahf", 110, &[]),
    ("Maryam", 98, &[]),
    ("Taha", 135, &["Ta-Ha"]),
    ("Al-Anbiya", 112, &["Al-Anbiya'"]),
    ("Al-Hajj", 78, &[]),
    ("Al-Mu'minun", 118, &["Al-Muminun"]),
    ("An-Nur", 64, &[]),
    ("Al-Furqan", 77, &[]),
    ("Asy-Syu'ara", 227, &["Asy-Syuara"]),
    ("An-Naml", 93, &[]),
    ("Al-Qasas", 88, &[]),
    ("Al-Ankabut", 69, &[]),
    ("Ar-Rum", 60, &[]),
    ("Luqman", 34, &[]),
    ("As-Sajdah", 30, &[]),
    ("Al-Ahzab", 73, &[]),
    ("Saba'", 54, &["Saba"]),
    ("Fatir", 45, &[]),
    ("Yasin", 83, &["Ya-Sin", "Yaseen"]),
    ("As-Saffat", 182, &[]),
    ("Sad", 88, &[]),
    ("Az-Zumar", 75, &[]),
    ("Ghafir", 85, &[]),
    ("Fussilat", 54, &[]),
    ("Asy-Syura", 53, &[]),
    ("Az-Zukhruf", 89, &[]),
    ("Ad-Dukhan", 59, &[]),
    ("Al-Jasiyah", 37, &[]),
    ("Al-Ahqaf", 35, &[]),
    ("Muhammad", 38, &[]),
    ("Al-Fath", 29, &[]),
    ("Al-Hujurat", 18, &[]),
    ("Qaf", 45, &[]),
    ("Az-Zariyat", 60, &[]),
    ("At-Tur", 49, &[]),
    ("An-Najm", 62, &[]),
    ("Al-Qamar", 55, &[]),
    ("Ar-Rahman", 78, &[]),
    ("Al-Waqi'ah", 96, &["Al-Waqiah"]),
    ("Al-Hadid", 29, &[]),
    ("Al-Mujadilah", 22, &[]),
    ("Al-Hasyr", 24, &[]),
    ("Al-Mumtahanah", 13, &[]),
    ("As-Saff", 14, &[]),
    ("Al-Jumu'ah", 11, &["Al-Jumuah"]),
    ("Al-Munafiqun", 11, &[]),
    ("At-Taghabun", 18, &[]),
    ("At-Talaq", 12, &[]),
    ("At-Tahrim", 12, &[]),
    ("Al-Mulk", 30, &[]),
    ("Al-Qalam", 52, &[]),
    ("Al-Haqqah", 52, &[]),
    ("Al-Ma'arij", 44, &["Al-Maarij"]),
    ("Nuh", 28, &[]),
    ("Al-Jinn", 28, &[]),
    ("Al-Muzzammil", 20, &[]),
    ("Al-Muddassir", 56, &[]),
    ("Al-Qiyamah", 40, &[]),
    ("Al-Insan", 31, &[]),
    ("Al-Mursalat", 50, &[]),
    ("An-Naba", 40, &[]),
    ("An-Nazi'at", 46, &["An-Naziat"]),
    ("Abasa", 42, &[]),
    ("At-Takwir", 29, &[]),
    ("Al-Infitar", 19, &[]),
    ("Al-Mutaffifin", 36, &[]),
    ("Al-Insyiqaq", 25, &[]),
    ("Al-Buruj", 22, &[]),
    ("At-Tariq", 17, &[]),
    ("Al-A'la", 19, &["Al-Ala"]),
    ("Al-Ghasyiyah", 26, &[]),
    ("Al-Fajr", 30, &[]),
    ("Al-Balad", 20, &[]),
    ("Asy-Syams", 15, &[]),
    ("Al-Lail", 21, &[]),
    ("Ad-Duha", 11, &[]),
    ("Asy-Syarh", 8, &[]),
    ("At-Tin", 8, &[]),
    ("Al-Alaq", 19, &[]),
    ("Al-Qadr", 5, &[]),
    ("Al-Bayyinah", 8, &[]),
    ("Az-Zalzalah", 8, &[]),
    ("Al-Adiyat", 11, &[]),
    ("Al-Qari'ah", 11, &["Al-Qariah"]),
    ("At-Takasur", 8, &[]),
    ("Al-Asr", 3, &[]),
    ("Al-Humazah", 9, &[]),
    ("Al-Fil", 5, &[]),
    ("Quraisy", 4, &[]),
    ("Al-Ma'un", 7, &["Al-Maun"]),
    ("Al-Kausar", 3, &[]),
    ("Al-Kafirun", 6, &[]),
    ("An-Nasr", 3, &[]),
    ("Al-Lahab", 5, &[]),
    ("Al-Ikhlas", 4, &["Al-Ikhlash"]),
    ("Al-Falaq", 5, &[]),
    ("An-Nas", 6, &[]),
];

/// Madani mushaf Juz boundaries: (start surah, start ayah, end surah, end ayah), inclusive.
const JUZ_TABLE: [(SurahNumber, u16, SurahNumber, u16); JUZ_COUNT] = [
    (1, 1, 2, 141),
    (2, 142, 2, 252),
    (2, 253, 3, 92),
    (3, 93, 4, 23),
    (4, 24, 4, 147),
    (4, 148, 5, 81),
    (5, 82, 6, 110),
    (6, 111, 7, 87),
    (7, 88, 8, 40),
    (8, 41, 9, 92),
    (9, 93, 11, 5),
    (11, 6, 12, 52),
    (12, 53, 14, 52),
    (15, 1, 16, 128),
    (17, 1, 18, 74),
    (18, 75, 20, 135),
    (21, 1, 22, 78),
    (23, 1, 25, 20),
    (25, 21, 27, 55),
    (27, 56, 29, 45),
    (29, 46, 33, 30),
    (33, 31, 36, 27),
    (36, 28, 39, 31),
    (39, 32, 41, 46),
    (41, 47, 45, 37),
    (46, 1, 51, 30),
    (51, 31, 57, 29),
    (58, 1, 66, 12),
    (67, 1, 77, 50),
    (78, 1, 114, 6),
];

#[derive(Debug, Clone)]
pub struct Surah {
    pub number: SurahNumber,
    pub canonical_name: &'static str,
    pub name_variants: &'static [&'static str],
    pub ayah_count: u16,
}

/// A run of consecutive ayat of one surah inside a Juz. `cumulative_offset` is
/// the number of Juz ayat that precede this segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JuzSegment {
    pub surah: SurahNumber,
    pub from_ayah: u16,
    pub to_ayah: u16,
    pub cumulative_offset: u32,
}

impl JuzSegment {
    pub fn len(&self) -> u32 {
        u32::from(self.to_ayah) - u32::from(self.from_ayah) + 1
    }

    pub fn contains(&self, surah: SurahNumber, ayah: u16) -> bool {
        self.surah == surah && ayah >= self.from_ayah && ayah <= self.to_ayah
    }
}

#[derive(Debug, Clone)]
pub struct JuzBoundary {
    pub juz_number: JuzNumber,
    pub segments: Vec<JuzSegment>,
}

impl JuzBoundary {
    pub fn total_ayah(&self) -> u32 {
        self.segments.iter().map(JuzSegment::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceDataError {
    #[error("surah table has {found} entries, expected 114")]
    SurahCount { found: usize },
    #[error("surah at position {position} is numbered {number}")]
    SurahNumbering { position: usize, number: SurahNumber },
    #[error("surah {surah} has no ayat")]
    EmptySurah { surah: SurahNumber },
    #[error("surah table counts {found} ayat, expected 6236")]
    AyatTotal { found: u32 },
    #[error("juz table has {found} entries, expected 30")]
    JuzCount { found: usize },
    #[error("juz at position {position} is numbered {number}")]
    JuzNumbering { position: usize, number: JuzNumber },
    #[error("juz {juz} references unknown surah {surah}")]
    UnknownSurah { juz: JuzNumber, surah: SurahNumber },
    #[error("juz {juz} segment {surah}:{from_ayah}-{to_ayah} is outside the surah")]
    SegmentBounds {
        juz: JuzNumber,
        surah: SurahNumber,
        from_ayah: u16,
        to_ayah: u16,
    },
    #[error("juz {juz} segment for surah {surah} has offset {found}, expected {expected}")]
    SegmentOffset {
        juz: JuzNumber,
        surah: SurahNumber,
        found: u32,
        expected: u32,
    },
    #[error("juz {juz} continues at {surah}:{ayah}, expected {expected_surah}:{expected_ayah}")]
    Discontinuity {
        juz: JuzNumber,
        surah: SurahNumber,
        ayah: u16,
        expected_surah: SurahNumber,
        expected_ayah: u16,
    },
    #[error("juz boundaries end before {surah}:{ayah}")]
    Incomplete { surah: SurahNumber, ayah: u16 },
}

/// The immutable Surah and Juz tables, validated once at startup.
#[derive(Debug, Clone)]
pub struct QuranIndex {
    surahs: Vec<Surah>,
    juz: Vec<JuzBoundary>,
}

impl QuranIndex {
    pub fn load() -> Result<Self, ReferenceDataError> {
        let surahs: Vec<Surah> = SURAH_TABLE
            .iter()
            .enumerate()
            .map(|(i, (name, ayah_count, variants))| Surah {
                number: (i + 1) as SurahNumber,
                canonical_name: *name,
                name_variants: *variants,
                ayah_count: *ayah_count,
            })
            .collect();
        let juz = build_juz_boundaries(&surahs, &JUZ_TABLE)?;
        Self::from_parts(surahs, juz)
    }

    pub fn from_parts(
        surahs: Vec<Surah>,
        juz: Vec<JuzBoundary>,
    ) -> Result<Self, ReferenceDataError> {
        validate_partition(&surahs, &juz)?;
        Ok(Self { surahs, juz })
    }

    pub fn surahs(&self) -> &[Surah] {
        &self.surahs
    }

    pub fn surah(&self, number: SurahNumber) -> Option<&Surah> {
        if number == 0 {
            return None;
        }
        self.surahs.get(usize::from(number) - 1)
    }

    pub fn juz_boundaries(&self) -> &[JuzBoundary] {
        &self.juz
    }

    pub fn juz(&self, number: JuzNumber) -> Option<&JuzBoundary> {
        if number == 0 {
            return None;
        }
        self.juz.get(usize::from(number) - 1)
    }

    /// The Juz containing `surah:ayah`, if that verse exists.
    pub fn locate(&self, surah: SurahNumber, ayah: u16) -> Option<JuzNumber> {
        self.juz
            .iter()
            .find(|b| b.segments.iter().any(|s| s.contains(surah, ayah)))
            .map(|b| b.juz_number)
    }

    /// Every Juz touched by `surah:start-end`, ascending.
    pub fn juz_span(&self, surah: SurahNumber, start: u16, end: u16) -> Vec<JuzNumber> {
        if start > end {
            return Vec::new();
        }
        self.juz
            .iter()
            .filter(|b| {
                b.segments
                    .iter()
                    .any(|s| s.surah == surah && start <= s.to_ayah && end >= s.from_ayah)
            })
            .map(|b| b.juz_number)
            .collect()
    }
}

fn build_juz_boundaries(
    surahs: &[Surah],
    table: &[(SurahNumber, u16, SurahNumber, u16)],
) -> Result<Vec<JuzBoundary>, ReferenceDataError> {
    let mut out = Vec::with_capacity(table.len());
    for (i, &(start_surah, start_ayah, end_surah, end_ayah)) in table.iter().enumerate() {
        let juz_number = (i + 1) as JuzNumber;
        let mut segments = Vec::new();
        let mut offset = 0_u32;
        for surah in start_surah..=end_surah {
            let Some(info) = surahs.get(usize::from(surah).wrapping_sub(1)) else {
                return Err(ReferenceDataError::UnknownSurah {
                    juz: juz_number,
                    surah,
                });
            };
            let from_ayah = if surah == start_surah { start_ayah } else { 1 };
            let to_ayah = if surah == end_surah {
                end_ayah
            } else {
                info.ayah_count
            };
            let segment = JuzSegment {
                surah,
                from_ayah,
                to_ayah,
                cumulative_offset: offset,
            };
            if from_ayah <= to_ayah {
                offset += segment.len();
            }
            segments.push(segment);
        }
        out.push(JuzBoundary {
            juz_number,
            segments,
        });
    }
    Ok(out)
}

fn validate_partition(surahs: &[Surah], juz: &[JuzBoundary]) -> Result<(), ReferenceDataError> {
    if surahs.len() != SURAH_COUNT {
        return Err(ReferenceDataError::SurahCount {
            found: surahs.len(),
        });
    }
    for (i, s) in surahs.iter().enumerate() {
        if usize::from(s.number) != i + 1 {
            return Err(ReferenceDataError::SurahNumbering {
                position: i,
                number: s.number,
            });
        }
        if s.ayah_count == 0 {
            return Err(ReferenceDataError::EmptySurah { surah: s.number });
        }
    }
    let ayat: u32 = surahs.iter().map(|s| u32::from(s.ayah_count)).sum();
    if ayat != TOTAL_AYAT {
        return Err(ReferenceDataError::AyatTotal { found: ayat });
    }
    if juz.len() != JUZ_COUNT {
        return Err(ReferenceDataError::JuzCount { found: juz.len() });
    }

    // Walk every segment in reading order; each must begin exactly where the
    // previous one stopped.
    let mut cursor: (SurahNumber, u16) = (1, 1);
    for (i, boundary) in juz.iter().enumerate() {
        let juz_number = boundary.juz_number;
        if usize::from(juz_number) != i + 1 {
            return Err(ReferenceDataError::JuzNumbering {
                position: i,
                number: juz_number,
            });
        }
        let mut expected_offset = 0_u32;
        for seg in &boundary.segments {
            let Some(info) = surahs.get(usize::from(seg.surah).wrapping_sub(1)) else {
                return Err(ReferenceDataError::UnknownSurah {
                    juz: juz_number,
                    surah: seg.surah,
                });
            };
            if seg.from_ayah == 0 || seg.from_ayah > seg.to_ayah || seg.to_ayah > info.ayah_count
            {
                return Err(ReferenceDataError::SegmentBounds {
                    juz: juz_number,
                    surah: seg.surah,
                    from_ayah: seg.from_ayah,
                    to_ayah: seg.to_ayah,
                });
            }
            if seg.cumulative_offset != expected_offset {
                return Err(ReferenceDataError::SegmentOffset {
                    juz: juz_number,
                    surah: seg.surah,
                    found: seg.cumulative_offset,
                    expected: expected_offset,
                });
            }
            if (seg.surah, seg.from_ayah) != cursor {
                return Err(ReferenceDataError::Discontinuity {
                    juz: juz_number,
                    surah: seg.surah,
                    ayah: seg.from_ayah,
                    expected_surah: cursor.0,
                    expected_ayah: cursor.1,
                });
            }
            expected_offset += seg.len();
            cursor = if seg.to_ayah == info.ayah_count {
                (seg.surah.saturating_add(1), 1)
            } else {
                (seg.surah, seg.to_ayah + 1)
            };
        }
    }

    let end = ((SURAH_COUNT + 1) as SurahNumber, 1);
    if cursor != end {
        return Err(ReferenceDataError::Incomplete {
            surah: cursor.0,
            ayah: cursor.1,
        });
    }
    Ok(())
}
