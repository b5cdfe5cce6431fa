use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::cache::LunarCalendarCache;
use crate::festival::{lunar_festival, solar_festivals};
use crate::ganzhi::{
    day_ganzhi, lunar_day_name, lunar_month_name, month_ganzhi, year_ganzhi, zodiac,
};

/// Everything a month view shows for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LunarDayInfo {
    pub solar: NaiveDate,
    pub ganzhi_year: String,
    pub ganzhi_month: String,
    pub ganzhi_day: String,
    pub lunar_month_name: String,
    pub lunar_day_name: String,
    pub lunar_leap_month: bool,
    pub term: Option<String>,
    pub solar_festivals: Vec<String>,
    pub lunar_festival: Option<String>,
    pub zodiac: String,
}

/// ## Summary
/// Full almanac reading of a solar date.
///
/// Returns `None` when the date is outside the lunar table.
#[must_use]
pub fn describe_day(cache: &LunarCalendarCache, date: NaiveDate) -> Option<LunarDayInfo> {
    let info = cache.solar_to_lunar(date)?;
    Some(LunarDayInfo {
        solar: date,
        ganzhi_year: year_ganzhi(info.lunar_year),
        ganzhi_month: month_ganzhi(date.year(), info.month_zhi),
        ganzhi_day: day_ganzhi(date),
        lunar_month_name: lunar_month_name(info.month, info.is_leap),
        lunar_day_name: lunar_day_name(info.day).to_string(),
        lunar_leap_month: info.is_leap,
        term: info.solar_term.map(|term| term.name().to_string()),
        solar_festivals: solar_festivals(date)
            .into_iter()
            .map(String::from)
            .collect(),
        lunar_festival: lunar_festival(&info).map(String::from),
        zodiac: zodiac(info.lunar_year).to_string(),
    })
}

/// One grid cell; `lunar` is empty for days outside the lunar table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCell {
    pub date: NaiveDate,
    pub lunar: Option<LunarDayInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LunarMonthView {
    /// Weekday of the 1st, counted from Sunday = 0.
    pub first_day_weekday: u32,
    pub days: u32,
    pub cells: Vec<MonthCell>,
}

const GRID_CELLS: usize = 6 * 7;

/// ## Summary
/// Lunar readings for every day of a solar month.
///
/// With `fill`, the month is padded with the tail of the previous month and
/// the head of the next so the grid starts on a Sunday and holds six weeks.
/// Returns `None` for an impossible year/month.
#[must_use]
pub fn lunar_month_calendar(
    cache: &LunarCalendarCache,
    year: i32,
    month: u32,
    fill: bool,
) -> Option<LunarMonthView> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = first.checked_add_months(Months::new(1))?;
    let days = u32::try_from(next_first.signed_duration_since(first).num_days()).ok()?;
    let first_day_weekday = first.weekday().num_days_from_sunday();

    let (grid_start, grid_len) = if fill {
        let start = first.checked_sub_days(chrono::Days::new(u64::from(first_day_weekday)))?;
        (start, GRID_CELLS)
    } else {
        (first, usize::try_from(days).ok()?)
    };

    let cells = grid_start
        .iter_days()
        .take(grid_len)
        .map(|date| MonthCell {
            date,
            lunar: describe_day(cache, date),
        })
        .collect();

    Some(LunarMonthView {
        first_day_weekday,
        days,
        cells,
    })
}
