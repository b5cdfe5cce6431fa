use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::solar_term::{SolarTerm, terms_of_year};
use crate::table::{self, FIRST_LUNAR_YEAR, LAST_LUNAR_YEAR};

/// A lunar month placed on the solar calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LunarMonth {
    pub lunar_year: i32,
    pub month: u32,
    pub is_leap: bool,
    pub days: u32,
    pub first_day: NaiveDate,
}

impl LunarMonth {
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        self.first_day
            .checked_add_days(Days::new(u64::from(self.days.saturating_sub(1))))
            .unwrap_or(self.first_day)
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day <= date && date <= self.last_day()
    }
}

/// Lunar reading of a single solar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LunarInfo {
    pub solar: NaiveDate,
    pub lunar_year: i32,
    /// Month name number, 1-12. A leap month shares the number of the month it follows.
    pub month: u32,
    pub day: u32,
    pub is_leap: bool,
    pub month_days: u32,
    pub month_first_day: NaiveDate,
    /// Number of sexagenary-month opening terms passed so far in the solar year.
    pub month_zhi: u32,
    pub solar_term: Option<SolarTerm>,
}

/// Lunar months and solar terms overlapping one solar year.
#[derive(Debug, Clone)]
pub struct LunarCalendar {
    year: i32,
    months: Vec<LunarMonth>,
    terms: Vec<(SolarTerm, NaiveDate)>,
}

impl LunarCalendar {
    /// ## Summary
    /// Builds the table for a solar year.
    ///
    /// Returns `None` when no lunar month of the supported range overlaps the year.
    #[must_use]
    pub fn new(year: i32) -> Option<Self> {
        if !(FIRST_LUNAR_YEAR..=LAST_LUNAR_YEAR + 1).contains(&year) {
            return None;
        }
        let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let dec_last = NaiveDate::from_ymd_opt(year, 12, 31)?;

        let mut months = Vec::with_capacity(26);
        for lunar_year in [year - 1, year] {
            let Some(mut first_day) = table::new_year(lunar_year) else {
                continue;
            };
            for spec in table::months_of_year(lunar_year) {
                let month = LunarMonth {
                    lunar_year,
                    month: spec.month,
                    is_leap: spec.is_leap,
                    days: spec.days,
                    first_day,
                };
                if month.last_day() >= jan_first && month.first_day <= dec_last {
                    months.push(month);
                }
                first_day = first_day.checked_add_days(Days::new(u64::from(spec.days)))?;
            }
        }
        if months.is_empty() {
            return None;
        }

        Some(Self {
            year,
            months,
            terms: terms_of_year(year).unwrap_or_default(),
        })
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// ## Summary
    /// Converts a solar month/day of this calendar's year to its lunar reading.
    ///
    /// Returns `None` for impossible dates and for days outside the lunar table.
    #[must_use]
    pub fn solar_day_to_lunar_day(&self, month: u32, day: u32) -> Option<LunarInfo> {
        self.lunar_info(NaiveDate::from_ymd_opt(self.year, month, day)?)
    }

    /// ## Summary
    /// Lunar reading of a date in this calendar's year.
    #[must_use]
    pub fn lunar_info(&self, date: NaiveDate) -> Option<LunarInfo> {
        if date.year() != self.year {
            return None;
        }
        let month = self.months.iter().find(|m| m.contains(date))?;
        let offset = date.signed_duration_since(month.first_day).num_days();
        let day = u32::try_from(offset).ok()? + 1;
        let month_zhi = self
            .terms
            .iter()
            .filter(|(term, at)| term.is_jie() && *at <= date)
            .count();

        Some(LunarInfo {
            solar: date,
            lunar_year: month.lunar_year,
            month: month.month,
            day,
            is_leap: month.is_leap,
            month_days: month.days,
            month_first_day: month.first_day,
            month_zhi: u32::try_from(month_zhi).unwrap_or_default(),
            solar_term: self
                .terms
                .iter()
                .find(|(_, at)| *at == date)
                .map(|(term, _)| *term),
        })
    }
}

/// ## Summary
/// Solar date of a lunar date, or `None` if the day does not exist in that
/// month (or the month is not a leap month of that year).
#[must_use]
pub fn lunar_to_solar(lunar_year: i32, month: u32, day: u32, is_leap: bool) -> Option<NaiveDate> {
    let mut first_day = table::new_year(lunar_year)?;
    for spec in table::months_of_year(lunar_year) {
        if spec.month == month && spec.is_leap == is_leap {
            if day == 0 || day > spec.days {
                return None;
            }
            return first_day.checked_add_days(Days::new(u64::from(day - 1)));
        }
        first_day = first_day.checked_add_days(Days::new(u64::from(spec.days)))?;
    }
    None
}
