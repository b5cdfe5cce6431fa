//! Expansion of lunar-anchored recurrences into solar dates.
//!
//! Both walks only ever move forward and share one iteration budget, so a
//! rule that never matches still terminates.

use std::collections::BTreeMap;

use almanac_core::constants::{MIN_LUNAR_MONTH_DAYS, MIN_LUNAR_YEAR_DAYS, RECURRENCE_ITERATION_LIMIT};
use almanac_core::types::Termination;
use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::cache::LunarCalendarCache;
use crate::calendar::LunarInfo;

/// Which lunar anniversary a series repeats on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LunarRecurrence {
    /// Same lunar day every lunar month.
    Monthly,
    /// Same lunar month and day every lunar year.
    Yearly,
}

/// Occurrence number (0 is the origin) to solar start date.
pub type LunarOccurrences = BTreeMap<u32, NaiveDate>;

/// Lunar recurrence rule bound to a calendar cache.
#[derive(Debug, Clone, Copy)]
pub struct LunarDateInfo<'a> {
    cache: &'a LunarCalendarCache,
    recurrence: LunarRecurrence,
    termination: Termination,
    duration_days: i64,
}

enum Step {
    Next(NaiveDate),
    Stop,
}

/// Mutable state of one expansion.
struct Walk {
    query_start: NaiveDate,
    query_end: NaiveDate,
    termination: Termination,
    duration_days: i64,
    count: u32,
    iterations: u32,
    dates: LunarOccurrences,
}

impl Walk {
    /// Spends one unit of the shared iteration budget.
    fn tick(&mut self) -> bool {
        self.iterations += 1;
        if self.iterations > RECURRENCE_ITERATION_LIMIT {
            tracing::warn!(
                limit = RECURRENCE_ITERATION_LIMIT,
                "Lunar recurrence walk hit the iteration limit"
            );
            return false;
        }
        true
    }

    fn is_within_time_frame(&self, date: NaiveDate) -> bool {
        let end = date
            .checked_add_signed(TimeDelta::days(self.duration_days))
            .unwrap_or(date);
        !(end < self.query_start || date > self.query_end)
    }

    /// Records an occurrence and computes the next candidate `step_days` later.
    fn add_solar_map(&mut self, date: NaiveDate, step_days: i64) -> Step {
        let until = self.termination.until();
        if until.is_some_and(|until| date > until) {
            return Step::Stop;
        }
        if self.is_within_time_frame(date) {
            tracing::trace!(index = self.count, %date, "Lunar occurrence");
            self.dates.insert(self.count, date);
        }
        self.count += 1;

        let count_reached = self
            .termination
            .count()
            .is_some_and(|limit| self.count >= limit);
        if count_reached || self.count > RECURRENCE_ITERATION_LIMIT {
            return Step::Stop;
        }

        let Some(next) = date.checked_add_signed(TimeDelta::days(step_days)) else {
            return Step::Stop;
        };
        if until.is_some_and(|until| next > until) || next > self.query_end {
            return Step::Stop;
        }
        Step::Next(next)
    }
}

impl<'a> LunarDateInfo<'a> {
    #[must_use]
    pub const fn new(
        cache: &'a LunarCalendarCache,
        recurrence: LunarRecurrence,
        termination: Termination,
        duration_days: i64,
    ) -> Self {
        Self {
            cache,
            recurrence,
            termination,
            duration_days,
        }
    }

    /// ## Summary
    /// Solar start dates of the series that fall in `[window_begin, window_end]`,
    /// keyed by occurrence number counted from `origin`.
    ///
    /// An occurrence starting before the window is kept when its duration
    /// reaches into it. Never fails: an inverted window, an origin after the
    /// window or an origin outside the lunar table yields an empty map.
    #[must_use]
    pub fn get_rrule_start_date(
        &self,
        window_begin: NaiveDate,
        window_end: NaiveDate,
        origin: NaiveDate,
    ) -> LunarOccurrences {
        if window_end < window_begin || origin > window_end {
            tracing::debug!(%window_begin, %window_end, %origin, "Lunar recurrence window is empty");
            return LunarOccurrences::new();
        }
        let Some(target) = self.cache.solar_to_lunar(origin) else {
            tracing::warn!(%origin, "Lunar recurrence origin outside lunar table");
            return LunarOccurrences::new();
        };

        let mut walk = Walk {
            query_start: window_begin.max(origin),
            query_end: window_end,
            termination: self.termination,
            duration_days: self.duration_days,
            count: 0,
            iterations: 0,
            dates: LunarOccurrences::new(),
        };
        match self.recurrence {
            LunarRecurrence::Monthly => self.walk_monthly(&mut walk, origin, &target),
            LunarRecurrence::Yearly => self.walk_yearly(&mut walk, origin, &target),
        }

        tracing::debug!(
            recurrence = ?self.recurrence,
            %origin,
            found = walk.dates.len(),
            iterations = walk.iterations,
            "Expanded lunar recurrence"
        );
        walk.dates
    }

    /// Moves `date` forward until its lunar day equals `target_day`, skipping
    /// months that lack that day.
    fn align_to_lunar_day(
        &self,
        walk: &mut Walk,
        mut date: NaiveDate,
        target_day: u32,
    ) -> Option<LunarInfo> {
        loop {
            let info = self.cache.solar_to_lunar(date)?;
            if info.day == target_day {
                return Some(info);
            }
            if !walk.tick() {
                return None;
            }
            let shift = i64::from(target_day) - i64::from(info.day);
            date = date.checked_add_signed(TimeDelta::days(shift))?;
        }
    }

    fn walk_monthly(&self, walk: &mut Walk, origin: NaiveDate, target: &LunarInfo) {
        let mut next = origin;
        while walk.tick() {
            let Some(current) = self.align_to_lunar_day(walk, next, target.day) else {
                break;
            };
            match walk.add_solar_map(current.solar, i64::from(current.month_days)) {
                Step::Next(date) => next = date,
                Step::Stop => break,
            }
        }
    }

    fn walk_yearly(&self, walk: &mut Walk, origin: NaiveDate, target: &LunarInfo) {
        let mut candidate = origin;
        while candidate <= walk.query_end && walk.tick() {
            let Some(current) = self.cache.solar_to_lunar(candidate) else {
                break;
            };
            let jump = match yearly_move(&current, target) {
                YearlyMove::Emit(offset) => {
                    let Some(date) = candidate.checked_add_signed(TimeDelta::days(offset)) else {
                        break;
                    };
                    match walk.add_solar_map(date, MIN_LUNAR_YEAR_DAYS) {
                        Step::Next(next) => {
                            candidate = next;
                            continue;
                        }
                        Step::Stop => break,
                    }
                }
                YearlyMove::Skip(days) => days.max(1),
            };
            let Some(next) = candidate.checked_add_signed(TimeDelta::days(jump)) else {
                break;
            };
            candidate = next;
        }
    }
}

enum YearlyMove {
    /// The target day lies `n` days ahead in the current lunar month.
    Emit(i64),
    /// Jump ahead by a lower-bound estimate of the distance to the next match.
    Skip(i64),
}

/// Decides how far a yearly walk may move from `current` towards `target`.
fn yearly_move(current: &LunarInfo, target: &LunarInfo) -> YearlyMove {
    let current_day = i64::from(current.day);
    let target_day = i64::from(target.day);
    let current_month = i64::from(current.month);
    let target_month = i64::from(target.month);

    if current.month > target.month {
        return YearlyMove::Skip((12 - current_month + target_month) * MIN_LUNAR_MONTH_DAYS - current_day);
    }
    if current.month < target.month {
        let months_ahead = target_month - current_month;
        return YearlyMove::Skip(if months_ahead > 1 {
            months_ahead * MIN_LUNAR_MONTH_DAYS - current_day + target_day
        } else {
            i64::from(current.month_days) - current_day + target_day
        });
    }

    if current.is_leap == target.is_leap {
        if current.day > target.day {
            YearlyMove::Skip(MIN_LUNAR_YEAR_DAYS - (current_day - target_day))
        } else if target.day > current.month_days {
            // This year's month is too short for the anniversary.
            YearlyMove::Skip(MIN_LUNAR_YEAR_DAYS)
        } else {
            YearlyMove::Emit(target_day - current_day)
        }
    } else if current.is_leap {
        // In the leap month, looking for the regular one: wait for next year.
        YearlyMove::Skip(MIN_LUNAR_YEAR_DAYS - (current_day - target_day))
    } else {
        // In the regular month, looking for its leap twin: step past this month.
        YearlyMove::Skip(i64::from(current.month_days) - current_day + 1)
    }
}
