use std::collections::BTreeSet;

use almanac_core::config::QueryConfig;
use almanac_core::types::QueryWindow;
use chrono::{NaiveDateTime, NaiveTime};

use super::descriptor::{PropertyStatus, QueryDescriptor, RepeatStatus};
use super::filter::{
    WeekdaySelection, monthly_schedule_filter, schedule_filter_by_date, schedule_filter_by_time,
    schedule_filter_by_title_name, sort_and_filter_schedule, weekday_selection,
    weekly_schedule_filter,
};
use super::time_limit::{get_time_filter_by_time_info, get_time_limit_by_time_info};
use crate::model::{OccurrenceMap, RRuleType};
use crate::store::ScheduleStore;

/// Answers one parsed query descriptor against a schedule store.
///
/// Every entry point returns a possibly empty map and never fails; invalid
/// descriptors are logged.
pub struct QueryScheduleProxy<'a> {
    store: &'a dyn ScheduleStore,
    descriptor: &'a QueryDescriptor,
    now: NaiveDateTime,
    config: &'a QueryConfig,
}

impl<'a> QueryScheduleProxy<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn ScheduleStore,
        descriptor: &'a QueryDescriptor,
        now: NaiveDateTime,
        config: &'a QueryConfig,
    ) -> Self {
        Self {
            store,
            descriptor,
            now,
            config,
        }
    }

    /// Look-ahead window used by repeat queries and "next" lookups.
    #[must_use]
    pub fn default_window(&self) -> QueryWindow {
        QueryWindow::months_from(self.now, self.config.default_window_months)
    }

    /// ## Summary
    /// Entry point: dispatches on the descriptor's repeat status.
    ///
    /// ## Side Effects
    /// Logs a warning and returns an empty map for an invalid descriptor.
    #[must_use]
    pub fn query_schedule(&self) -> OccurrenceMap {
        if let Err(err) = self.descriptor.validate() {
            tracing::warn!(error = %err, "Rejecting invalid schedule query");
            return OccurrenceMap::new();
        }

        let status = self.descriptor.repeat_status;
        tracing::debug!(?status, title = %self.descriptor.title, "Querying schedules");
        let window = self.default_window();
        let found = match status {
            RepeatStatus::None => return self.query_non_repeating_schedule(),
            RepeatStatus::EveryDay => self.query_every_day_schedule(&window),
            RepeatStatus::EveryWeek => {
                let (begin, end) = self.descriptor.repeat_range();
                let weekly = self.query_weekly_schedule(&window, begin, end);
                self.filter_by_suggested_time(weekly)
            }
            RepeatStatus::EveryMonth => {
                let (begin, end) = self.descriptor.repeat_range();
                self.query_monthly_schedule(&window, begin, end)
            }
            RepeatStatus::EveryYear => {
                let mut yearly = self.query_every_year_schedule(&window);
                if let [only] = self.descriptor.suggested.as_slice() {
                    yearly = schedule_filter_by_date(yearly, only.datetime.date(), window.last_day());
                }
                self.filter_by_suggested_time(yearly)
            }
            RepeatStatus::RestDay => self.query_weekly_schedule(&window, 6, 7),
            RepeatStatus::WorkDay => self.query_working_day_schedule(&window),
        };
        schedule_filter_by_title_name(found, &self.descriptor.title)
    }

    fn filter_by_suggested_time(&self, map: OccurrenceMap) -> OccurrenceMap {
        match self.get_time_filter_by_time_info() {
            Some((begin, end)) => {
                tracing::debug!(%begin, %end, "Filtering by time of day");
                schedule_filter_by_time(map, begin, end)
            }
            None => map,
        }
    }

    /// ## Summary
    /// Weekly-repeating instances touching weekdays `begin..=end`
    /// (1 = Monday .. 7 = Sunday, wrapping past Sunday when `begin > end`).
    ///
    /// Monday to Friday is answered by the working-day recurrence and a full
    /// week by the daily recurrence. A 0 bound means any weekday.
    #[must_use]
    pub fn query_weekly_schedule(&self, window: &QueryWindow, begin: u32, end: u32) -> OccurrenceMap {
        let weekdays = match weekday_selection(begin, end) {
            WeekdaySelection::WorkingDays => return self.query_working_day_schedule(window),
            WeekdaySelection::EveryDay => return self.query_every_day_schedule(window),
            WeekdaySelection::Any => BTreeSet::new(),
            WeekdaySelection::Days(days) => days,
        };
        let found = self.store.query_schedule_by_rrule(window, RRuleType::Week);
        weekly_schedule_filter(self.sort_and_filter_schedule(found), &weekdays)
    }

    /// ## Summary
    /// Monthly-repeating instances touching days `begin..=end` of the month,
    /// wrapping past the month end when `begin > end`. A 0 bound means any day.
    #[must_use]
    pub fn query_monthly_schedule(&self, window: &QueryWindow, begin: u32, end: u32) -> OccurrenceMap {
        let found = self.store.query_schedule_by_rrule(window, RRuleType::Month);
        monthly_schedule_filter(self.sort_and_filter_schedule(found), begin, end)
    }

    #[must_use]
    pub fn query_every_day_schedule(&self, window: &QueryWindow) -> OccurrenceMap {
        self.sort_and_filter_schedule(self.store.query_schedule_by_rrule(window, RRuleType::Day))
    }

    #[must_use]
    pub fn query_every_year_schedule(&self, window: &QueryWindow) -> OccurrenceMap {
        self.sort_and_filter_schedule(self.store.query_schedule_by_rrule(window, RRuleType::Year))
    }

    #[must_use]
    pub fn query_working_day_schedule(&self, window: &QueryWindow) -> OccurrenceMap {
        self.sort_and_filter_schedule(self.store.query_schedule_by_rrule(window, RRuleType::Work))
    }

    /// ## Summary
    /// Answers a query without a repeat status according to its property
    /// status: all matches inside the suggested time limit, the next upcoming
    /// instance, or nothing for "last".
    #[must_use]
    pub fn query_non_repeating_schedule(&self) -> OccurrenceMap {
        if !self.time_frame_is_valid() {
            tracing::warn!("Suggested time frame ends before it begins");
            return OccurrenceMap::new();
        }
        match self.descriptor.property_status {
            PropertyStatus::All | PropertyStatus::None => match self.get_time_limit_by_time_info() {
                Some(limit) => self.query_all_schedule(&self.descriptor.title, &limit),
                None => OccurrenceMap::new(),
            },
            PropertyStatus::Next => self.query_next_num_schedule(&self.default_window(), 1),
            PropertyStatus::Last => {
                tracing::debug!("Queries for the last schedule are not answered");
                OccurrenceMap::new()
            }
        }
    }

    #[must_use]
    pub fn query_next_num_schedule(&self, window: &QueryWindow, count: usize) -> OccurrenceMap {
        self.sort_and_filter_schedule(self.store.query_schedule_by_limit(window, count))
    }

    #[must_use]
    pub fn query_all_schedule(&self, key: &str, window: &QueryWindow) -> OccurrenceMap {
        self.sort_and_filter_schedule(self.store.query_schedule_by_summary(window, key))
    }

    /// Dedupes, drops festival entries and empty days, and orders each day.
    #[must_use]
    pub fn sort_and_filter_schedule(&self, map: OccurrenceMap) -> OccurrenceMap {
        sort_and_filter_schedule(map, |type_id| self.store.is_festival_schedule(type_id))
    }

    /// Window for non-repeating queries; `None` when the suggestion is expired.
    #[must_use]
    pub fn get_time_limit_by_time_info(&self) -> Option<QueryWindow> {
        get_time_limit_by_time_info(
            &self.descriptor.suggested,
            self.now,
            self.default_window(),
            self.config.max_days_in_future,
        )
    }

    #[must_use]
    pub fn get_time_filter_by_time_info(&self) -> Option<(NaiveTime, NaiveTime)> {
        get_time_filter_by_time_info(&self.descriptor.suggested)
    }

    #[must_use]
    pub fn time_frame_is_valid(&self) -> bool {
        self.descriptor.time_frame_is_valid()
    }
}
