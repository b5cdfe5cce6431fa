//! Expansion of stored schedules into concrete occurrences inside a window.

use std::collections::BTreeSet;

use almanac_core::constants::RECURRENCE_ITERATION_LIMIT;
use almanac_core::types::{QueryWindow, Termination};
use almanac_lunar::{LunarCalendarCache, LunarDateInfo, LunarRecurrence};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use rrule::{RRule, Tz, Unvalidated};

use crate::error::{ScheduleError, ScheduleResult};
use crate::model::{Occurrence, OccurrenceMap, RecurrenceKind, RecurrenceRule, Schedule};

fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// ## Summary
/// RRULE text for a solar recurrence kind anchored at `origin`.
///
/// Returns `None` for lunar kinds, which the rrule engine cannot express.
#[must_use]
pub fn solar_rrule_text(
    kind: &RecurrenceKind,
    termination: Termination,
    origin: NaiveDateTime,
) -> Option<String> {
    let mut text = match kind {
        RecurrenceKind::Daily => "FREQ=DAILY".to_string(),
        RecurrenceKind::Weekly { weekdays } => {
            let mut days = if weekdays.is_empty() {
                vec![origin.weekday()]
            } else {
                weekdays.clone()
            };
            days.sort_by_key(Weekday::num_days_from_monday);
            days.dedup();
            let codes: Vec<&str> = days.into_iter().map(weekday_code).collect();
            format!("FREQ=WEEKLY;BYDAY={}", codes.join(","))
        }
        RecurrenceKind::Monthly { days_of_month } => {
            let days: BTreeSet<u32> = if days_of_month.is_empty() {
                BTreeSet::from([origin.day()])
            } else {
                days_of_month.iter().copied().collect()
            };
            let days: Vec<String> = days.into_iter().map(|day| day.to_string()).collect();
            format!("FREQ=MONTHLY;BYMONTHDAY={}", days.join(","))
        }
        RecurrenceKind::Yearly => "FREQ=YEARLY".to_string(),
        RecurrenceKind::Workday => "FREQ=DAILY;BYDAY=MO,TU,WE,TH,FR".to_string(),
        RecurrenceKind::RestDay => "FREQ=WEEKLY;BYDAY=SA,SU".to_string(),
        RecurrenceKind::LunarMonthly | RecurrenceKind::LunarYearly => return None,
    };

    match termination {
        Termination::Never => {}
        Termination::AfterCount(count) => text.push_str(&format!(";COUNT={count}")),
        Termination::UntilDate(until) => {
            text.push_str(&format!(";UNTIL={}T235959Z", until.format("%Y%m%d")));
        }
    }
    Some(text)
}

/// Does `[start, end]` touch the window? All-day instances compare by date.
fn touches_window(
    window: &QueryWindow,
    all_day: bool,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> bool {
    if all_day {
        start.date() <= window.last_day() && end.date() >= window.first_day()
    } else {
        window.overlaps(start, end)
    }
}

/// Start instants of a solar series whose instance may overlap the window.
fn solar_starts(
    schedule: &Schedule,
    rule: &RecurrenceRule,
    window: &QueryWindow,
) -> ScheduleResult<Vec<NaiveDateTime>> {
    let Some(rrule_text) = solar_rrule_text(&rule.kind, rule.termination, schedule.dt_start) else {
        return Err(ScheduleError::RecurrenceError(format!(
            "{:?} is not a solar recurrence",
            rule.kind
        )));
    };
    tracing::trace!(rrule = %rrule_text, schedule_id = %schedule.id, "Expanding solar recurrence");

    let rrule = rrule_text
        .parse::<RRule<Unvalidated>>()
        .map_err(|err| ScheduleError::RecurrenceError(err.to_string()))?;
    let dt_start = schedule.dt_start.and_utc().with_timezone(&Tz::UTC);
    let mut rrule_set = rrule
        .build(dt_start)
        .map_err(|err| ScheduleError::RecurrenceError(err.to_string()))?;

    // Widened by the duration so instances that started earlier but still run are kept.
    let lead = schedule.duration().max(TimeDelta::zero()) + TimeDelta::seconds(1);
    let from = if schedule.all_day {
        window.first_day().and_time(NaiveTime::MIN)
    } else {
        window.begin
    };
    let inclusive_start = from.checked_sub_signed(lead).unwrap_or(from);
    let inclusive_end = window
        .end
        .checked_add_signed(TimeDelta::seconds(1))
        .unwrap_or(window.end);
    rrule_set = rrule_set
        .after(inclusive_start.and_utc().with_timezone(&Tz::UTC))
        .before(inclusive_end.and_utc().with_timezone(&Tz::UTC));

    let limit = u16::try_from(RECURRENCE_ITERATION_LIMIT).unwrap_or(u16::MAX);
    let result = rrule_set.all(limit);
    if result.limited {
        tracing::warn!(schedule_id = %schedule.id, limit, "Solar recurrence hit the iteration limit");
    }
    Ok(result.dates.iter().map(|date| date.naive_utc()).collect())
}

fn lunar_starts(
    cache: &LunarCalendarCache,
    schedule: &Schedule,
    rule: &RecurrenceRule,
    recurrence: LunarRecurrence,
    window: &QueryWindow,
) -> Vec<NaiveDateTime> {
    let info = LunarDateInfo::new(cache, recurrence, rule.termination, schedule.span_days());
    let time_of_day = schedule.dt_start.time();
    info.get_rrule_start_date(window.first_day(), window.last_day(), schedule.dt_start.date())
        .into_values()
        .map(|date| date.and_time(time_of_day))
        .collect()
}

/// ## Summary
/// Every instance of `schedule` overlapping `window`, ordered by start.
///
/// The origin is always an instance of its own series. Exclusion dates
/// remove instances by start date. A solar rule the rrule engine rejects is
/// logged and degrades to the origin alone.
#[must_use]
pub fn expand_schedule(
    cache: &LunarCalendarCache,
    schedule: &Schedule,
    window: &QueryWindow,
) -> Vec<Occurrence> {
    if !window.is_valid() {
        tracing::debug!(begin = %window.begin, end = %window.end, "Inverted expansion window");
        return Vec::new();
    }

    let Some(rule) = &schedule.recurrence else {
        return touches_window(window, schedule.all_day, schedule.dt_start, schedule.dt_end)
            .then(|| schedule.occurrence_at(schedule.dt_start))
            .into_iter()
            .collect();
    };

    let mut starts: BTreeSet<NaiveDateTime> = BTreeSet::from([schedule.dt_start]);
    match rule.kind {
        RecurrenceKind::LunarMonthly => {
            starts.extend(lunar_starts(cache, schedule, rule, LunarRecurrence::Monthly, window));
        }
        RecurrenceKind::LunarYearly => {
            starts.extend(lunar_starts(cache, schedule, rule, LunarRecurrence::Yearly, window));
        }
        _ => match solar_starts(schedule, rule, window) {
            Ok(found) => starts.extend(found),
            Err(err) => {
                tracing::warn!(schedule_id = %schedule.id, error = %err, "Falling back to the series origin");
            }
        },
    }

    let duration = schedule.duration();
    starts
        .into_iter()
        .filter(|start| !rule.exclusions.contains(&start.date()))
        .filter(|start| {
            let end = start.checked_add_signed(duration).unwrap_or(*start);
            touches_window(window, schedule.all_day, *start, end)
        })
        .map(|start| schedule.occurrence_at(start))
        .collect()
}

/// Last calendar day an instance occupies; an end at exactly midnight does not occupy that day.
fn last_covered_day(occurrence: &Occurrence) -> NaiveDate {
    let end_date = occurrence.dt_end.date();
    if occurrence.dt_end.time() == NaiveTime::MIN && end_date > occurrence.dt_start.date() {
        end_date.pred_opt().unwrap_or(end_date)
    } else {
        end_date
    }
}

/// ## Summary
/// Groups the instances of `schedules` in `window` by day.
///
/// Without `extend_multi_day` an instance is listed under its start date
/// only. With it, an instance spanning several days is listed under every
/// day it covers inside the window. Each day is ordered by start, then end.
#[must_use]
pub fn convert_schedules<'s>(
    cache: &LunarCalendarCache,
    schedules: impl IntoIterator<Item = &'s Schedule>,
    window: &QueryWindow,
    extend_multi_day: bool,
) -> OccurrenceMap {
    let mut map = OccurrenceMap::new();
    for schedule in schedules {
        for occurrence in expand_schedule(cache, schedule, window) {
            if extend_multi_day {
                let first = occurrence.dt_start.date().max(window.first_day());
                let last = last_covered_day(&occurrence).min(window.last_day());
                for day in first.iter_days().take_while(|day| *day <= last) {
                    map.entry(day).or_default().push(occurrence.clone());
                }
            } else {
                map.entry(occurrence.dt_start.date())
                    .or_default()
                    .push(occurrence);
            }
        }
    }
    for day in map.values_mut() {
        day.sort_by_key(|occurrence| (occurrence.dt_start, occurrence.dt_end));
    }
    map
}
