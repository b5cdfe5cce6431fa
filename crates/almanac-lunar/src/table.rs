//! Packed lunar year records for 1900-2100.
//!
//! Each record holds, from the low bits up: the leap month number (bits
//! 0-3, zero when the year has none), the long/short flag of months 12
//! down to 1 (bits 4-15, set means 30 days) and the length of the leap
//! month (bit 16, set means 30 days).

use chrono::{Days, NaiveDate};

pub const FIRST_LUNAR_YEAR: i32 = 1900;
pub const LAST_LUNAR_YEAR: i32 = 2100;

#[rustfmt::skip]
const LUNAR_YEAR_INFO: [u32; 201] = [
    0x04bd8, 0x04ae0, 0x0a570, 0x054d5, 0x0d260, 0x0d950, 0x16554, 0x056a0, 0x09ad0, 0x055d2, // 1900
    0x04ae0, 0x0a5b6, 0x0a4d0, 0x0d250, 0x1d255, 0x0b540, 0x0d6a0, 0x0ada2, 0x095b0, 0x14977, // 1910
    0x04970, 0x0a4b0, 0x0b4b5, 0x06a50, 0x06d40, 0x1ab54, 0x02b60, 0x09570, 0x052f2, 0x04970, // 1920
    0x06566, 0x0d4a0, 0x0ea50, 0x16a95, 0x05ad0, 0x02b60, 0x186e3, 0x092e0, 0x1c8d7, 0x0c950, // 1930
    0x0d4a0, 0x1d8a6, 0x0b550, 0x056a0, 0x1a5b4, 0x025d0, 0x092d0, 0x0d2b2, 0x0a950, 0x0b557, // 1940
    0x06ca0, 0x0b550, 0x15355, 0x04da0, 0x0a5b0, 0x14573, 0x052b0, 0x0a9a8, 0x0e950, 0x06aa0, // 1950
    0x0aea6, 0x0ab50, 0x04b60, 0x0aae4, 0x0a570, 0x05260, 0x0f263, 0x0d950, 0x05b57, 0x056a0, // 1960
    0x096d0, 0x04dd5, 0x04ad0, 0x0a4d0, 0x0d4d4, 0x0d250, 0x0d558, 0x0b540, 0x0b6a0, 0x195a6, // 1970
    0x095b0, 0x049b0, 0x0a974, 0x0a4b0, 0x0b27a, 0x06a50, 0x06d40, 0x0af46, 0x0ab60, 0x09570, // 1980
    0x04af5, 0x04970, 0x064b0, 0x074a3, 0x0ea50, 0x06b58, 0x05ac0, 0x0ab60, 0x096d5, 0x092e0, // 1990
    0x0c960, 0x0d954, 0x0d4a0, 0x0da50, 0x07552, 0x056a0, 0x0abb7, 0x025d0, 0x092d0, 0x0cab5, // 2000
    0x0a950, 0x0b4a0, 0x0baa4, 0x0ad50, 0x055d9, 0x04ba0, 0x0a5b0, 0x15176, 0x052b0, 0x0a930, // 2010
    0x07954, 0x06aa0, 0x0ad50, 0x05b52, 0x04b60, 0x0a6e6, 0x0a4e0, 0x0d260, 0x0ea65, 0x0d530, // 2020
    0x05aa0, 0x076a3, 0x096d0, 0x04afb, 0x04ad0, 0x0a4d0, 0x1d0b6, 0x0d250, 0x0d520, 0x0dd45, // 2030
    0x0b5a0, 0x056d0, 0x055b2, 0x049b0, 0x0a577, 0x0a4b0, 0x0aa50, 0x1b255, 0x06d20, 0x0ada0, // 2040
    0x14b63, 0x09370, 0x049f8, 0x04970, 0x064b0, 0x168a6, 0x0ea50, 0x06b20, 0x1a6c4, 0x0aae0, // 2050
    0x092e0, 0x0d2e3, 0x0c960, 0x0d557, 0x0d4a0, 0x0da50, 0x05d55, 0x056a0, 0x0a6d0, 0x055d4, // 2060
    0x052d0, 0x0a9b8, 0x0a950, 0x0b4a0, 0x0b6a6, 0x0ad50, 0x055a0, 0x0aba4, 0x0a5b0, 0x052b0, // 2070
    0x0b273, 0x06930, 0x07337, 0x06aa0, 0x0ad50, 0x14b55, 0x04b60, 0x0a570, 0x054e4, 0x0d160, // 2080
    0x0e968, 0x0d520, 0x0daa0, 0x16aa6, 0x056d0, 0x04ae0, 0x0a9d4, 0x0a2d0, 0x0d150, 0x0f252, // 2090
    0x0d520, // 2100
];

/// Solar date of lunar 1900-01-01.
#[must_use]
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 31).unwrap_or(NaiveDate::MIN)
}

fn record(lunar_year: i32) -> Option<u32> {
    let index = usize::try_from(lunar_year.checked_sub(FIRST_LUNAR_YEAR)?).ok()?;
    LUNAR_YEAR_INFO.get(index).copied()
}

#[must_use]
pub fn is_supported(lunar_year: i32) -> bool {
    (FIRST_LUNAR_YEAR..=LAST_LUNAR_YEAR).contains(&lunar_year)
}

/// Number of the month followed by a leap month, if the year has one.
#[must_use]
pub fn leap_month(lunar_year: i32) -> Option<u32> {
    let leap = record(lunar_year)? & 0xf;
    (leap != 0).then_some(leap)
}

/// Length of a regular (non-leap) month.
#[must_use]
pub fn month_days(lunar_year: i32, month: u32) -> Option<u32> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let info = record(lunar_year)?;
    Some(if info & (0x1_0000 >> month) == 0 { 29 } else { 30 })
}

#[must_use]
pub fn leap_month_days(lunar_year: i32) -> Option<u32> {
    leap_month(lunar_year)?;
    let info = record(lunar_year)?;
    Some(if info & 0x1_0000 == 0 { 29 } else { 30 })
}

/// A lunar month as it appears in sequence within its lunar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSpec {
    pub month: u32,
    pub is_leap: bool,
    pub days: u32,
}

/// ## Summary
/// Lists the months of a lunar year in calendar order, with the leap month
/// (if any) placed right after its namesake.
#[must_use]
pub fn months_of_year(lunar_year: i32) -> Vec<MonthSpec> {
    let leap = leap_month(lunar_year);
    let mut months = Vec::with_capacity(13);
    for month in 1..=12 {
        let Some(days) = month_days(lunar_year, month) else {
            return Vec::new();
        };
        months.push(MonthSpec {
            month,
            is_leap: false,
            days,
        });
        if leap == Some(month) {
            if let Some(days) = leap_month_days(lunar_year) {
                months.push(MonthSpec {
                    month,
                    is_leap: true,
                    days,
                });
            }
        }
    }
    months
}

#[must_use]
pub fn year_days(lunar_year: i32) -> Option<u32> {
    let months = months_of_year(lunar_year);
    (!months.is_empty()).then(|| months.iter().map(|m| m.days).sum())
}

/// Solar date of the first day of the given lunar year.
#[must_use]
pub fn new_year(lunar_year: i32) -> Option<NaiveDate> {
    if !is_supported(lunar_year) {
        return None;
    }
    let offset: u32 = (FIRST_LUNAR_YEAR..lunar_year)
        .filter_map(year_days)
        .sum();
    epoch().checked_add_days(Days::new(u64::from(offset)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn new_years_match_known_dates() {
        assert_eq!(new_year(1900), Some(date(1900, 1, 31)));
        assert_eq!(new_year(2000), Some(date(2000, 2, 5)));
        assert_eq!(new_year(2023), Some(date(2023, 1, 22)));
        assert_eq!(new_year(2024), Some(date(2024, 2, 10)));
        assert_eq!(new_year(2025), Some(date(2025, 1, 29)));
        assert_eq!(new_year(2026), Some(date(2026, 2, 17)));
        assert_eq!(new_year(2100), Some(date(2100, 2, 9)));
        assert_eq!(new_year(2101), None);
    }

    #[test]
    fn every_new_year_falls_between_late_january_and_late_february() {
        for year in FIRST_LUNAR_YEAR..=LAST_LUNAR_YEAR {
            let start = new_year(year).expect("supported year");
            assert_eq!(start.year(), year);
            assert!(
                start >= date(year, 1, 21) && start <= date(year, 2, 20),
                "lunar new year {year} at {start}"
            );
        }
    }

    #[test]
    fn year_lengths_are_plausible() {
        for year in FIRST_LUNAR_YEAR..=LAST_LUNAR_YEAR {
            let days = year_days(year).expect("supported year");
            assert!((353..=385).contains(&days), "lunar year {year} has {days} days");
            let months = months_of_year(year);
            assert_eq!(months.len(), if leap_month(year).is_some() { 13 } else { 12 });
            assert!(months.iter().filter(|m| m.is_leap).count() <= 1);
        }
    }

    #[test]
    fn leap_months_known() {
        assert_eq!(leap_month(2020), Some(4));
        assert_eq!(leap_month(2023), Some(2));
        assert_eq!(leap_month(2024), None);
        assert_eq!(leap_month(2025), Some(6));
    }

    #[test]
    fn out_of_range_years_have_no_record() {
        assert_eq!(month_days(1899, 1), None);
        assert_eq!(month_days(2024, 13), None);
        assert!(months_of_year(2101).is_empty());
    }
}
