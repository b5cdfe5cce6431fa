//! Pure predicates and post-filters applied to query results.

use std::collections::{BTreeSet, HashSet};

use almanac_core::constants::{MONTHLY_SPAN_COVERS_ALL_DAYS, ONE_DAY_SECS, WEEKLY_SPAN_COVERS_ALL_DAYS};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::{Occurrence, OccurrenceMap};

/// Weekdays a weekly query asks for, 1 = Monday .. 7 = Sunday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeekdaySelection {
    /// No weekday constraint.
    Any,
    /// Monday to Friday; answered by the working-day recurrence.
    WorkingDays,
    /// Every weekday; answered by the daily recurrence.
    EveryDay,
    Days(BTreeSet<u32>),
}

/// ## Summary
/// Turns the `(begin, end)` weekday bounds of a weekly query into a selection.
///
/// A range with `begin > end` wraps past Sunday; a wrap leaving a single gap
/// covers the whole week. A bound of 0 means "any weekday".
#[must_use]
pub fn weekday_selection(begin: u32, end: u32) -> WeekdaySelection {
    if begin == end {
        if begin == 0 {
            return WeekdaySelection::Any;
        }
        return WeekdaySelection::Days(BTreeSet::from([begin]));
    }
    if begin < end {
        match (begin, end) {
            (1, 5) => return WeekdaySelection::WorkingDays,
            (1, 7) => return WeekdaySelection::EveryDay,
            (0, _) => return WeekdaySelection::Any,
            _ => {}
        }
        return WeekdaySelection::Days((begin..=end).collect());
    }
    if begin - end == 1 {
        return WeekdaySelection::EveryDay;
    }
    if end == 0 {
        return WeekdaySelection::Any;
    }
    let days = (begin..=end + 7)
        .map(|day| match day % 7 {
            0 => 7,
            wrapped => wrapped,
        })
        .collect();
    WeekdaySelection::Days(days)
}

/// ## Summary
/// Does an instance running from `start` to `end` touch any weekday in `weekdays`?
///
/// Instances spanning more than five days cover every weekday.
#[must_use]
pub fn weekly_is_intersections(
    start: NaiveDateTime,
    end: NaiveDateTime,
    weekdays: &BTreeSet<u32>,
) -> bool {
    let day_offset = end.date().signed_duration_since(start.date()).num_days();
    if day_offset > WEEKLY_SPAN_COVERS_ALL_DAYS {
        return true;
    }
    let first = start.weekday().number_from_monday();
    (0..=day_offset.max(0))
        .filter_map(|offset| u32::try_from(offset).ok())
        .map(|offset| (first - 1 + offset) % 7 + 1)
        .any(|weekday| weekdays.contains(&weekday))
}

/// ## Summary
/// Does an instance touch any day of month in `[begin_day, end_day]`?
///
/// The range wraps past the month end when `begin_day > end_day`. Every day
/// the instance covers is checked, and instances longer than 30 days always
/// match.
#[must_use]
pub fn monthly_is_intersections(
    start: NaiveDateTime,
    end: NaiveDateTime,
    begin_day: u32,
    end_day: u32,
) -> bool {
    let day_offset = end.date().signed_duration_since(start.date()).num_days();
    if day_offset > MONTHLY_SPAN_COVERS_ALL_DAYS {
        return true;
    }
    let wanted = |day: u32| {
        if begin_day <= end_day {
            begin_day <= day && day <= end_day
        } else {
            day >= begin_day || day <= end_day
        }
    };
    start
        .date()
        .iter_days()
        .take_while(|day| *day <= end.date())
        .any(|day| wanted(day.day()))
}

/// ## Summary
/// Do two time-of-day ranges overlap? A range whose end precedes its begin
/// wraps past midnight.
#[must_use]
pub fn checked_time_is_intersection(
    begin: NaiveTime,
    end: NaiveTime,
    filter_begin: NaiveTime,
    filter_end: NaiveTime,
) -> bool {
    let wraps = end < begin;
    let filter_wraps = filter_end < filter_begin;
    match (wraps, filter_wraps) {
        // Both contain midnight.
        (true, true) => true,
        (true, false) => !(filter_begin > end && filter_end < begin),
        (false, true) => !(begin > filter_end && end < filter_begin),
        (false, false) => begin <= filter_end && filter_begin <= end,
    }
}

fn retain_occurrences(
    map: OccurrenceMap,
    mut keep: impl FnMut(&Occurrence) -> bool,
) -> OccurrenceMap {
    map.into_iter()
        .filter_map(|(day, occurrences)| {
            let kept: Vec<Occurrence> = occurrences.into_iter().filter(|o| keep(o)).collect();
            (!kept.is_empty()).then_some((day, kept))
        })
        .collect()
}

/// ## Summary
/// Removes duplicate instances and festival entries per day, drops empty
/// days and orders each day by start, then end.
#[must_use]
pub fn sort_and_filter_schedule(
    map: OccurrenceMap,
    is_festival: impl Fn(&str) -> bool,
) -> OccurrenceMap {
    map.into_iter()
        .filter_map(|(day, occurrences)| {
            let mut seen = HashSet::new();
            let mut kept: Vec<Occurrence> = occurrences
                .into_iter()
                .filter(|o| !is_festival(&o.schedule_type_id))
                .filter(|o| seen.insert(o.instance_id()))
                .collect();
            kept.sort_by_key(|o| (o.dt_start, o.dt_end));
            (!kept.is_empty()).then_some((day, kept))
        })
        .collect()
}

/// Keeps instances touching the selected weekdays; an empty set keeps everything.
#[must_use]
pub fn weekly_schedule_filter(map: OccurrenceMap, weekdays: &BTreeSet<u32>) -> OccurrenceMap {
    if weekdays.is_empty() {
        return map;
    }
    retain_occurrences(map, |o| weekly_is_intersections(o.dt_start, o.dt_end, weekdays))
}

/// Keeps instances touching days `[begin_day, end_day]`; a 0 bound keeps everything.
#[must_use]
pub fn monthly_schedule_filter(map: OccurrenceMap, begin_day: u32, end_day: u32) -> OccurrenceMap {
    if begin_day == 0 || end_day == 0 {
        return map;
    }
    retain_occurrences(map, |o| {
        monthly_is_intersections(o.dt_start, o.dt_end, begin_day, end_day)
    })
}

/// ## Summary
/// Keeps instances whose time of day overlaps `[begin, end]`.
///
/// Instances lasting a full day or longer always pass.
#[must_use]
pub fn schedule_filter_by_time(map: OccurrenceMap, begin: NaiveTime, end: NaiveTime) -> OccurrenceMap {
    retain_occurrences(map, |o| {
        o.duration().num_seconds() >= ONE_DAY_SECS
            || checked_time_is_intersection(o.dt_start.time(), o.dt_end.time(), begin, end)
    })
}

/// Keeps instances whose dates overlap `[begin, end]`.
#[must_use]
pub fn schedule_filter_by_date(map: OccurrenceMap, begin: NaiveDate, end: NaiveDate) -> OccurrenceMap {
    retain_occurrences(map, |o| o.dt_start.date() <= end && o.dt_end.date() >= begin)
}

/// Keeps instances whose summary contains `name`; an empty name keeps everything.
#[must_use]
pub fn schedule_filter_by_title_name(map: OccurrenceMap, name: &str) -> OccurrenceMap {
    if name.is_empty() {
        return map;
    }
    retain_occurrences(map, |o| o.summary.contains(name))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .expect("valid datetime")
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn occurrence(summary: &str, type_id: &str, start: NaiveDateTime, end: NaiveDateTime) -> Occurrence {
        Occurrence {
            schedule_id: Uuid::new_v4(),
            summary: summary.to_string(),
            schedule_type_id: type_id.to_string(),
            all_day: false,
            dt_start: start,
            dt_end: end,
            recurrence_id: None,
        }
    }

    fn single(o: Occurrence) -> OccurrenceMap {
        OccurrenceMap::from([(o.dt_start.date(), vec![o])])
    }

    #[test]
    fn weekday_selection_shapes() {
        assert_eq!(weekday_selection(0, 0), WeekdaySelection::Any);
        assert_eq!(weekday_selection(3, 3), WeekdaySelection::Days(BTreeSet::from([3])));
        assert_eq!(weekday_selection(1, 5), WeekdaySelection::WorkingDays);
        assert_eq!(weekday_selection(1, 7), WeekdaySelection::EveryDay);
        assert_eq!(weekday_selection(2, 4), WeekdaySelection::Days(BTreeSet::from([2, 3, 4])));
        assert_eq!(weekday_selection(0, 4), WeekdaySelection::Any);
        assert_eq!(weekday_selection(5, 4), WeekdaySelection::EveryDay);
        assert_eq!(weekday_selection(5, 0), WeekdaySelection::Any);
        assert_eq!(
            weekday_selection(6, 2),
            WeekdaySelection::Days(BTreeSet::from([1, 2, 6, 7]))
        );
    }

    #[test]
    fn weekly_intersections() {
        let weekend = BTreeSet::from([6, 7]);
        // 2024-06-07 is a Friday.
        assert!(!weekly_is_intersections(dt(2024, 6, 7, 9, 0), dt(2024, 6, 7, 10, 0), &weekend));
        assert!(weekly_is_intersections(dt(2024, 6, 7, 22, 0), dt(2024, 6, 8, 1, 0), &weekend));
        // Sunday into Monday wraps the weekday counter.
        assert!(weekly_is_intersections(dt(2024, 6, 9, 22, 0), dt(2024, 6, 10, 1, 0), &BTreeSet::from([1])));
        assert!(weekly_is_intersections(dt(2024, 6, 3, 9, 0), dt(2024, 6, 10, 9, 0), &BTreeSet::from([3])));
    }

    #[test]
    fn monthly_intersections() {
        assert!(monthly_is_intersections(dt(2024, 6, 10, 9, 0), dt(2024, 6, 10, 10, 0), 8, 12));
        assert!(!monthly_is_intersections(dt(2024, 6, 13, 9, 0), dt(2024, 6, 14, 10, 0), 8, 12));
        // Wrapping range 28..3 catches the 1st.
        assert!(monthly_is_intersections(dt(2024, 6, 1, 9, 0), dt(2024, 6, 1, 10, 0), 28, 3));
        assert!(!monthly_is_intersections(dt(2024, 6, 15, 9, 0), dt(2024, 6, 15, 10, 0), 28, 3));
        // A span crossing the month end covers days 30, 1 and 2.
        assert!(monthly_is_intersections(dt(2024, 6, 30, 9, 0), dt(2024, 7, 2, 10, 0), 1, 1));
        assert!(monthly_is_intersections(dt(2024, 1, 1, 0, 0), dt(2024, 2, 15, 0, 0), 20, 20));
    }

    #[test]
    fn time_intersections() {
        let check = |b, e, fb, fe| checked_time_is_intersection(b, e, fb, fe);
        assert!(check(time(22, 0), time(2, 0), time(23, 0), time(1, 0)));
        assert!(check(time(22, 0), time(2, 0), time(0, 30), time(0, 45)));
        assert!(!check(time(22, 0), time(2, 0), time(10, 0), time(11, 0)));
        assert!(check(time(0, 30), time(0, 45), time(22, 0), time(2, 0)));
        assert!(!check(time(10, 0), time(11, 0), time(22, 0), time(2, 0)));
        // Neither wraps: any overlap counts, including containment.
        assert!(check(time(9, 0), time(12, 0), time(10, 0), time(11, 0)));
        assert!(check(time(10, 0), time(11, 0), time(9, 0), time(12, 0)));
        assert!(!check(time(9, 0), time(10, 0), time(10, 30), time(11, 0)));
    }

    #[test]
    fn sort_and_filter_dedupes_and_drops_festivals() {
        let day = dt(2024, 6, 1, 0, 0).date();
        let late = occurrence("late", "work", dt(2024, 6, 1, 15, 0), dt(2024, 6, 1, 16, 0));
        let early = occurrence("early", "work", dt(2024, 6, 1, 9, 0), dt(2024, 6, 1, 10, 0));
        let festival = occurrence("儿童节", "festival", dt(2024, 6, 1, 0, 0), dt(2024, 6, 1, 23, 59));
        let empty_day = dt(2024, 6, 2, 0, 0).date();
        let map = OccurrenceMap::from([
            (day, vec![late.clone(), festival, early.clone(), late.clone()]),
            (empty_day, vec![]),
        ]);
        let filtered = sort_and_filter_schedule(map, |id| id == "festival");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[&day], vec![early, late]);
    }

    #[test]
    fn time_filter_skips_long_instances() {
        let short = occurrence("short", "work", dt(2024, 6, 1, 9, 0), dt(2024, 6, 1, 10, 0));
        let long = occurrence("long", "work", dt(2024, 6, 1, 9, 0), dt(2024, 6, 2, 9, 0));
        assert!(schedule_filter_by_time(single(short), time(14, 0), time(15, 0)).is_empty());
        assert_eq!(schedule_filter_by_time(single(long), time(14, 0), time(15, 0)).len(), 1);
    }

    #[test]
    fn date_and_title_filters() {
        let o = occurrence("team lunch", "work", dt(2024, 6, 3, 12, 0), dt(2024, 6, 5, 13, 0));
        let d = |day| NaiveDate::from_ymd_opt(2024, 6, day).expect("valid date");
        assert_eq!(schedule_filter_by_date(single(o.clone()), d(4), d(10)).len(), 1);
        assert!(schedule_filter_by_date(single(o.clone()), d(6), d(10)).is_empty());
        assert_eq!(schedule_filter_by_title_name(single(o.clone()), "lunch").len(), 1);
        assert_eq!(schedule_filter_by_title_name(single(o.clone()), "").len(), 1);
        assert!(schedule_filter_by_title_name(single(o), "dinner").is_empty());
    }
}
