use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Datelike, NaiveDate};

use crate::calendar::{LunarCalendar, LunarInfo};

/// Memoized per-solar-year lunar calendars.
///
/// Lookups take a single mutex around check, build and insert; entries are
/// immutable once built and shared through `Arc`.
#[derive(Debug, Default)]
pub struct LunarCalendarCache {
    years: Mutex<HashMap<i32, Arc<LunarCalendar>>>,
}

impl LunarCalendarCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Returns the calendar for a solar year, building it on first use.
    ///
    /// Years outside the lunar table yield `None` and are not cached.
    #[must_use]
    pub fn calendar(&self, year: i32) -> Option<Arc<LunarCalendar>> {
        let mut years = self.years.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(calendar) = years.get(&year) {
            return Some(Arc::clone(calendar));
        }
        let Some(calendar) = LunarCalendar::new(year) else {
            tracing::trace!(year, "Year outside lunar table");
            return None;
        };
        let calendar = Arc::new(calendar);
        years.insert(year, Arc::clone(&calendar));
        tracing::trace!(year, cached = years.len(), "Built lunar calendar");
        Some(calendar)
    }

    #[must_use]
    pub fn solar_to_lunar(&self, date: NaiveDate) -> Option<LunarInfo> {
        self.calendar(date.year())?.lunar_info(date)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.years
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// ## Summary
    /// Drops every cached year.
    ///
    /// ## Side Effects
    /// Subsequent lookups rebuild their calendars.
    pub fn clear(&self) {
        let mut years = self.years.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(cached = years.len(), "Clearing lunar calendar cache");
        years.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn calendars_are_built_once() {
        let cache = LunarCalendarCache::new();
        let first = cache.calendar(2024).expect("supported year");
        let second = cache.calendar(2024).expect("supported year");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test_log::test]
    fn unsupported_years_are_not_cached() {
        let cache = LunarCalendarCache::new();
        assert!(cache.calendar(1800).is_none());
        assert!(cache.is_empty());
    }

    #[test_log::test]
    fn clear_empties_the_cache() {
        let cache = LunarCalendarCache::new();
        let date = NaiveDate::from_ymd_opt(2024, 2, 10).expect("valid date");
        assert!(cache.solar_to_lunar(date).is_some());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.solar_to_lunar(date).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test_log::test]
    fn concurrent_lookups_share_one_entry() {
        let cache = LunarCalendarCache::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for year in 2020..2030 {
                        assert!(cache.calendar(year).is_some());
                    }
                });
            }
        });
        assert_eq!(cache.len(), 10);
    }
}
