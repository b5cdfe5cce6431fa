//! Sexagenary (stem-branch) labels, zodiac animals and lunar month/day names.

use chrono::{Datelike, NaiveDate};

const HEAVENLY_STEMS: [&str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];

const EARTHLY_BRANCHES: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];

const ZODIAC_ANIMALS: [&str; 12] = [
    "鼠", "牛", "虎", "兔", "龙", "蛇", "马", "羊", "猴", "鸡", "狗", "猪",
];

const LUNAR_MONTH_NAMES: [&str; 12] = [
    "正", "二", "三", "四", "五", "六", "七", "八", "九", "十", "冬", "腊",
];

const LUNAR_DAY_NAMES: [&str; 30] = [
    "初一", "初二", "初三", "初四", "初五", "初六", "初七", "初八", "初九", "初十",
    "十一", "十二", "十三", "十四", "十五", "十六", "十七", "十八", "十九", "二十",
    "廿一", "廿二", "廿三", "廿四", "廿五", "廿六", "廿七", "廿八", "廿九", "三十",
];

/// Offset that puts 1970-01-01 at its place in the 60-day cycle (辛巳).
const UNIX_EPOCH_DAY_CYCLE_OFFSET: i64 = 29_219 + 18;

fn cycle_index(n: i64, len: usize) -> usize {
    let len_i64 = i64::try_from(len).unwrap_or(i64::MAX);
    usize::try_from(n.rem_euclid(len_i64)).unwrap_or_default()
}

/// ## Summary
/// Stem-branch label for a position in the 60-cycle.
#[must_use]
pub fn stem_branch(n: i64) -> String {
    format!(
        "{}{}",
        HEAVENLY_STEMS[cycle_index(n, HEAVENLY_STEMS.len())],
        EARTHLY_BRANCHES[cycle_index(n, EARTHLY_BRANCHES.len())]
    )
}

#[must_use]
pub fn year_ganzhi(lunar_year: i32) -> String {
    stem_branch(i64::from(lunar_year) - 1864)
}

/// ## Summary
/// Month label for a solar year and the number of "jie" terms already passed
/// in that year.
#[must_use]
pub fn month_ganzhi(solar_year: i32, month_zhi: u32) -> String {
    stem_branch((i64::from(solar_year) - 1900) * 12 + i64::from(month_zhi) + 12)
}

#[must_use]
pub fn day_ganzhi(date: NaiveDate) -> String {
    let days_since_epoch = i64::from(date.num_days_from_ce()) - i64::from(unix_epoch_days_from_ce());
    stem_branch(days_since_epoch + UNIX_EPOCH_DAY_CYCLE_OFFSET)
}

fn unix_epoch_days_from_ce() -> i32 {
    NaiveDate::from_ymd_opt(1970, 1, 1).map_or(719_163, |d| d.num_days_from_ce())
}

fn name_at(names: &[&'static str], one_based: u32) -> Option<&'static str> {
    let index = usize::try_from(one_based.checked_sub(1)?).ok()?;
    names.get(index).copied()
}

#[must_use]
pub fn zodiac(lunar_year: i32) -> &'static str {
    ZODIAC_ANIMALS[cycle_index(i64::from(lunar_year) - 4, ZODIAC_ANIMALS.len())]
}

/// ## Summary
/// Display name of a lunar month, e.g. `正月` or `闰四月`.
///
/// Returns an empty string for month numbers outside 1-12.
#[must_use]
pub fn lunar_month_name(month: u32, is_leap: bool) -> String {
    let Some(name) = name_at(&LUNAR_MONTH_NAMES, month) else {
        return String::new();
    };
    if is_leap {
        format!("闰{name}月")
    } else {
        format!("{name}月")
    }
}

#[must_use]
pub fn lunar_day_name(day: u32) -> &'static str {
    name_at(&LUNAR_DAY_NAMES, day).unwrap_or_default()
}
