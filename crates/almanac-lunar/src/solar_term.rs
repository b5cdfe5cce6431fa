//! The 24 solar terms, computed per solar year from the century-constant
//! approximation with the published per-year corrections.

use chrono::NaiveDate;
use serde::Serialize;

pub const FIRST_TERM_YEAR: i32 = 1900;
pub const LAST_TERM_YEAR: i32 = 2100;

/// Solar terms in calendar order starting from the first term of January.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SolarTerm {
    MinorCold,
    MajorCold,
    StartOfSpring,
    RainWater,
    AwakeningOfInsects,
    SpringEquinox,
    QingMing,
    GrainRain,
    StartOfSummer,
    GrainBuds,
    GrainInEar,
    SummerSolstice,
    MinorHeat,
    MajorHeat,
    StartOfAutumn,
    EndOfHeat,
    WhiteDew,
    AutumnEquinox,
    ColdDew,
    FrostDescent,
    StartOfWinter,
    MinorSnow,
    MajorSnow,
    WinterSolstice,
}

impl SolarTerm {
    pub const ALL: [Self; 24] = [
        Self::MinorCold,
        Self::MajorCold,
        Self::StartOfSpring,
        Self::RainWater,
        Self::AwakeningOfInsects,
        Self::SpringEquinox,
        Self::QingMing,
        Self::GrainRain,
        Self::StartOfSummer,
        Self::GrainBuds,
        Self::GrainInEar,
        Self::SummerSolstice,
        Self::MinorHeat,
        Self::MajorHeat,
        Self::StartOfAutumn,
        Self::EndOfHeat,
        Self::WhiteDew,
        Self::AutumnEquinox,
        Self::ColdDew,
        Self::FrostDescent,
        Self::StartOfWinter,
        Self::MinorSnow,
        Self::MajorSnow,
        Self::WinterSolstice,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Solar month (1-12) the term falls in.
    #[must_use]
    pub const fn solar_month(self) -> u32 {
        (self as u32) / 2 + 1
    }

    /// The "jie" terms open a sexagenary month; the others are mid-month "qi".
    #[must_use]
    pub const fn is_jie(self) -> bool {
        (self as usize) % 2 == 0
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MinorCold => "小寒",
            Self::MajorCold => "大寒",
            Self::StartOfSpring => "立春",
            Self::RainWater => "雨水",
            Self::AwakeningOfInsects => "惊蛰",
            Self::SpringEquinox => "春分",
            Self::QingMing => "清明",
            Self::GrainRain => "谷雨",
            Self::StartOfSummer => "立夏",
            Self::GrainBuds => "小满",
            Self::GrainInEar => "芒种",
            Self::SummerSolstice => "夏至",
            Self::MinorHeat => "小暑",
            Self::MajorHeat => "大暑",
            Self::StartOfAutumn => "立秋",
            Self::EndOfHeat => "处暑",
            Self::WhiteDew => "白露",
            Self::AutumnEquinox => "秋分",
            Self::ColdDew => "寒露",
            Self::FrostDescent => "霜降",
            Self::StartOfWinter => "立冬",
            Self::MinorSnow => "小雪",
            Self::MajorSnow => "大雪",
            Self::WinterSolstice => "冬至",
        }
    }
}

impl std::fmt::Display for SolarTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const CENTURY_20: [f64; 24] = [
    6.11, 20.84, 4.6295, 19.4599, 6.3826, 21.4155, 5.59, 20.888, 6.318, 21.86, 6.5, 22.2, 7.928,
    23.65, 8.35, 23.95, 8.44, 23.822, 9.098, 24.218, 8.218, 23.08, 7.9, 22.6,
];

const CENTURY_21: [f64; 24] = [
    5.4055, 20.12, 3.87, 18.73, 5.63, 20.646, 4.81, 20.1, 5.52, 21.04, 5.678, 21.37, 7.108, 22.83,
    7.5, 23.13, 7.646, 23.042, 8.318, 23.438, 7.438, 22.36, 7.18, 21.94,
];

/// (year, term index, day delta) for years where the approximation is off by one.
const CORRECTIONS: [(i32, usize, i64); 21] = [
    (1902, 10, 1),
    (1911, 8, 1),
    (1918, 23, -1),
    (1922, 13, 1),
    (1925, 12, 1),
    (1927, 16, 1),
    (1928, 11, 1),
    (1942, 17, 1),
    (1954, 22, 1),
    (1978, 21, 1),
    (1982, 0, 1),
    (2002, 14, 1),
    (2008, 9, 1),
    (2016, 12, 1),
    (2019, 0, -1),
    (2021, 23, -1),
    (2026, 3, -1),
    (2082, 1, 1),
    (2084, 5, 1),
    (2089, 19, 1),
    (2089, 20, 1),
];

#[expect(clippy::cast_possible_truncation)]
fn term_day(year: i32, index: usize) -> i64 {
    let (constants, offset) = if year <= 2000 {
        (&CENTURY_20, year - 1900)
    } else {
        (&CENTURY_21, year - 2000)
    };
    let leap_days = if index < 4 {
        (offset - 1).div_euclid(4)
    } else {
        offset.div_euclid(4)
    };
    let approx = (f64::from(offset) * 0.2422 + constants[index]).floor() as i64;
    let correction = CORRECTIONS
        .iter()
        .find(|(y, i, _)| *y == year && *i == index)
        .map_or(0, |(_, _, delta)| *delta);
    approx - i64::from(leap_days) + correction
}

/// ## Summary
/// Computes the solar date of a single term in the given solar year.
///
/// Returns `None` outside 1900-2100.
#[must_use]
pub fn term_date(year: i32, term: SolarTerm) -> Option<NaiveDate> {
    if !(FIRST_TERM_YEAR..=LAST_TERM_YEAR).contains(&year) {
        return None;
    }
    let day = u32::try_from(term_day(year, term.index())).ok()?;
    NaiveDate::from_ymd_opt(year, term.solar_month(), day)
}

/// ## Summary
/// All 24 term dates of a solar year, in calendar order.
///
/// Returns `None` outside 1900-2100.
#[must_use]
pub fn terms_of_year(year: i32) -> Option<Vec<(SolarTerm, NaiveDate)>> {
    SolarTerm::ALL
        .iter()
        .map(|term| term_date(year, *term).map(|date| (*term, date)))
        .collect()
}
