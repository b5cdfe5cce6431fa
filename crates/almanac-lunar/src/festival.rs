use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::cache::LunarCalendarCache;
use crate::calendar::LunarInfo;
use crate::solar_term::SolarTerm;

struct SolarFestival {
    month: u32,
    day: u32,
    name: &'static str,
    /// First year the festival is observed.
    since: Option<i32>,
}

#[rustfmt::skip]
const SOLAR_FESTIVALS: [SolarFestival; 14] = [
    SolarFestival { month: 1, day: 1, name: "元旦", since: None },
    SolarFestival { month: 2, day: 14, name: "情人节", since: None },
    SolarFestival { month: 3, day: 8, name: "妇女节", since: Some(1910) },
    SolarFestival { month: 3, day: 12, name: "植树节", since: Some(1979) },
    SolarFestival { month: 4, day: 1, name: "愚人节", since: None },
    SolarFestival { month: 5, day: 1, name: "劳动节", since: Some(1890) },
    SolarFestival { month: 5, day: 4, name: "青年节", since: Some(1939) },
    SolarFestival { month: 6, day: 1, name: "儿童节", since: Some(1950) },
    SolarFestival { month: 7, day: 1, name: "建党节", since: Some(1941) },
    SolarFestival { month: 8, day: 1, name: "建军节", since: Some(1933) },
    SolarFestival { month: 9, day: 10, name: "教师节", since: Some(1985) },
    SolarFestival { month: 10, day: 1, name: "国庆节", since: Some(1949) },
    SolarFestival { month: 12, day: 24, name: "平安夜", since: None },
    SolarFestival { month: 12, day: 25, name: "圣诞节", since: None },
];

/// (month, day, name); month/day are lunar.
const LUNAR_FESTIVALS: [(u32, u32, &str); 12] = [
    (1, 1, "春节"),
    (1, 15, "元宵节"),
    (2, 2, "龙头节"),
    (5, 5, "端午节"),
    (7, 7, "七夕节"),
    (7, 15, "中元节"),
    (8, 15, "中秋节"),
    (9, 9, "重阳节"),
    (10, 1, "寒衣节"),
    (10, 15, "下元节"),
    (12, 8, "腊八节"),
    (12, 23, "小年"),
];

const NEW_YEARS_EVE: &str = "除夕";
const QING_MING_FESTIVAL: &str = "清明节";

/// ## Summary
/// Fixed-date and floating (Mother's/Father's Day) solar festivals on a date.
#[must_use]
pub fn solar_festivals(date: NaiveDate) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = SOLAR_FESTIVALS
        .iter()
        .filter(|f| f.month == date.month() && f.day == date.day())
        .filter(|f| f.since.is_none_or(|since| date.year() >= since))
        .map(|f| f.name)
        .collect();

    if NaiveDate::from_weekday_of_month_opt(date.year(), 5, Weekday::Sun, 2) == Some(date) {
        names.push("母亲节");
    }
    if NaiveDate::from_weekday_of_month_opt(date.year(), 6, Weekday::Sun, 3) == Some(date) {
        names.push("父亲节");
    }
    names
}

/// ## Summary
/// Lunar festival falling on the given lunar day, if any.
///
/// Leap months carry no festivals. The last day of the twelfth month is
/// New Year's Eve regardless of month length.
#[must_use]
pub fn lunar_festival(info: &LunarInfo) -> Option<&'static str> {
    if !info.is_leap {
        if let Some((_, _, name)) = LUNAR_FESTIVALS
            .iter()
            .find(|(month, day, _)| *month == info.month && *day == info.day)
        {
            return Some(*name);
        }
        if info.month == 12 && info.day == info.month_days {
            return Some(NEW_YEARS_EVE);
        }
    }
    (info.solar_term == Some(SolarTerm::QingMing)).then_some(QING_MING_FESTIVAL)
}

/// Festival names observed on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayFestivals {
    pub date: NaiveDate,
    pub names: Vec<String>,
}

/// ## Summary
/// Every day in `[start, end]` that carries at least one festival.
///
/// An inverted range is logged and yields nothing.
#[must_use]
pub fn festivals_in_range(
    cache: &LunarCalendarCache,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DayFestivals> {
    if start > end {
        tracing::warn!(%start, %end, "Festival range start is after its end");
        return Vec::new();
    }

    let festival_days: Vec<DayFestivals> = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter_map(|date| {
            let mut names: Vec<String> = solar_festivals(date)
                .into_iter()
                .map(String::from)
                .collect();
            if let Some(name) = cache.solar_to_lunar(date).as_ref().and_then(lunar_festival) {
                names.push(name.to_string());
            }
            (!names.is_empty()).then_some(DayFestivals { date, names })
        })
        .collect();

    tracing::debug!(%start, %end, found = festival_days.len(), "Collected festivals");
    festival_days
}

/// ## Summary
/// Keeps, per day, only the festival names containing `key`; days left with
/// no names are dropped.
#[must_use]
pub fn filter_day_festivals(days: &[DayFestivals], key: &str) -> Vec<DayFestivals> {
    days.iter()
        .filter_map(|day| {
            let names: Vec<String> = day
                .names
                .iter()
                .filter(|name| name.contains(key))
                .cloned()
                .collect();
            (!names.is_empty()).then(|| DayFestivals {
                date: day.date,
                names,
            })
        })
        .collect()
}
