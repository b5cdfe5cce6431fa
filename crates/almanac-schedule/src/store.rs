//! Schedule storage seam used by the query proxy.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use almanac_core::constants::FESTIVAL_SCHEDULE_TYPE_ID;
use almanac_core::types::{QueryWindow, end_of_day};
use almanac_lunar::LunarCalendarCache;
use almanac_lunar::festival::{festivals_in_range, filter_day_festivals};
use chrono::NaiveTime;
use uuid::Uuid;

use crate::error::{ScheduleError, ScheduleResult};
use crate::expand::convert_schedules;
use crate::model::{
    Occurrence, OccurrenceMap, Privilege, RRuleType, Schedule, ScheduleDocument, ScheduleType,
};

/// Source of schedule occurrences for queries.
pub trait ScheduleStore: Send + Sync {
    /// Instances of schedules whose recurrence maps to `rrule_type`, keyed by start date.
    fn query_schedule_by_rrule(
        &self,
        window: &QueryWindow,
        rrule_type: RRuleType,
    ) -> OccurrenceMap;

    /// Instances whose summary contains `key` (every schedule when `key` is
    /// empty), listed under every day they cover.
    fn query_schedule_by_summary(&self, window: &QueryWindow, key: &str) -> OccurrenceMap;

    /// The earliest `top` instances in the window, keyed by start date.
    fn query_schedule_by_limit(&self, window: &QueryWindow, top: usize) -> OccurrenceMap;

    /// True when schedules of this type are read-only festival entries.
    fn is_festival_schedule(&self, schedule_type_id: &str) -> bool;
}

#[derive(Debug, Default)]
struct StoreData {
    types: HashMap<String, ScheduleType>,
    schedules: Vec<Schedule>,
}

/// Thread-safe schedule store held in memory, optionally backed by a JSON document.
#[derive(Debug)]
pub struct InMemoryScheduleStore {
    cache: Arc<LunarCalendarCache>,
    data: RwLock<StoreData>,
    festival_overlay: bool,
}

fn festival_type() -> ScheduleType {
    ScheduleType {
        id: FESTIVAL_SCHEDULE_TYPE_ID.to_string(),
        display_name: "Festivals".to_string(),
        privilege: Privilege::None,
    }
}

impl InMemoryScheduleStore {
    #[must_use]
    pub fn new(cache: Arc<LunarCalendarCache>) -> Self {
        let festival = festival_type();
        let data = StoreData {
            types: HashMap::from([(festival.id.clone(), festival)]),
            schedules: Vec::new(),
        };
        Self {
            cache,
            data: RwLock::new(data),
            festival_overlay: true,
        }
    }

    /// Whether summary queries also return festival days.
    #[must_use]
    pub const fn with_festival_overlay(mut self, enabled: bool) -> Self {
        self.festival_overlay = enabled;
        self
    }

    #[must_use]
    pub fn from_document(cache: Arc<LunarCalendarCache>, document: ScheduleDocument) -> Self {
        let store = Self::new(cache);
        for schedule_type in document.types {
            store.add_schedule_type(schedule_type);
        }
        for schedule in document.schedules {
            store.add_schedule(schedule);
        }
        store
    }

    /// ## Summary
    /// Loads a store from a JSON schedule document on disk.
    ///
    /// ## Errors
    /// Returns an error if the file cannot be read or is not a valid document.
    pub fn load(cache: Arc<LunarCalendarCache>, path: impl AsRef<Path>) -> ScheduleResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let document: ScheduleDocument = serde_json::from_str(&text)?;
        tracing::info!(
            path = %path.display(),
            schedules = document.schedules.len(),
            types = document.types.len(),
            "Loaded schedule document"
        );
        Ok(Self::from_document(cache, document))
    }

    /// ## Summary
    /// Writes the user schedules and types to `path` as a JSON document.
    ///
    /// ## Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> ScheduleResult<()> {
        let text = serde_json::to_string_pretty(&self.document())?;
        std::fs::write(path.as_ref(), text)?;
        tracing::debug!(path = %path.as_ref().display(), "Saved schedule document");
        Ok(())
    }

    /// Snapshot of the stored schedules and non-built-in types.
    #[must_use]
    pub fn document(&self) -> ScheduleDocument {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        let mut types: Vec<ScheduleType> = data
            .types
            .values()
            .filter(|t| t.id != FESTIVAL_SCHEDULE_TYPE_ID)
            .cloned()
            .collect();
        types.sort_by(|a, b| a.id.cmp(&b.id));
        ScheduleDocument {
            types,
            schedules: data.schedules.clone(),
        }
    }

    pub fn add_schedule_type(&self, schedule_type: ScheduleType) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.types.insert(schedule_type.id.clone(), schedule_type);
    }

    /// Inserts or replaces a schedule by id.
    pub fn add_schedule(&self, schedule: Schedule) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = data.schedules.iter_mut().find(|s| s.id == schedule.id) {
            *existing = schedule;
        } else {
            data.schedules.push(schedule);
        }
    }

    /// ## Summary
    /// Removes a schedule and returns it.
    ///
    /// ## Errors
    /// Returns `NotFound` if no schedule has this id.
    pub fn remove_schedule(&self, id: Uuid) -> ScheduleResult<Schedule> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let index = data
            .schedules
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ScheduleError::NotFound(format!("schedule {id}")))?;
        let removed = data.schedules.remove(index);
        tracing::debug!(schedule_id = %id, "Removed schedule");
        Ok(removed)
    }

    #[must_use]
    pub fn schedule(&self, id: Uuid) -> Option<Schedule> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.schedules.iter().find(|s| s.id == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .schedules
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn convert_matching(
        &self,
        window: &QueryWindow,
        extend_multi_day: bool,
        predicate: impl Fn(&Schedule) -> bool,
    ) -> OccurrenceMap {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        convert_schedules(
            &self.cache,
            data.schedules.iter().filter(|s| predicate(s)),
            window,
            extend_multi_day,
        )
    }

    /// Festival days in the window whose names contain `key`, as all-day entries.
    fn festival_occurrences(&self, window: &QueryWindow, key: &str) -> OccurrenceMap {
        let days = festivals_in_range(&self.cache, window.first_day(), window.last_day());
        let mut map = OccurrenceMap::new();
        for day in filter_day_festivals(&days, key) {
            for name in day.names {
                let seed = format!("festival:{}:{name}", day.date);
                let schedule_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes());
                map.entry(day.date).or_default().push(Occurrence {
                    schedule_id,
                    summary: name,
                    schedule_type_id: FESTIVAL_SCHEDULE_TYPE_ID.to_string(),
                    all_day: true,
                    dt_start: day.date.and_time(NaiveTime::MIN),
                    dt_end: day.date.and_time(end_of_day()),
                    recurrence_id: None,
                });
            }
        }
        map
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn query_schedule_by_rrule(
        &self,
        window: &QueryWindow,
        rrule_type: RRuleType,
    ) -> OccurrenceMap {
        let map = self.convert_matching(window, false, |s| s.rrule_type() == rrule_type);
        tracing::debug!(?rrule_type, days = map.len(), "Queried schedules by recurrence type");
        map
    }

    fn query_schedule_by_summary(&self, window: &QueryWindow, key: &str) -> OccurrenceMap {
        let mut map = self.convert_matching(window, true, |s| s.summary.contains(key));
        if self.festival_overlay {
            for (day, festivals) in self.festival_occurrences(window, key) {
                map.entry(day).or_default().extend(festivals);
            }
        }
        tracing::debug!(key, days = map.len(), "Queried schedules by summary");
        map
    }

    fn query_schedule_by_limit(&self, window: &QueryWindow, top: usize) -> OccurrenceMap {
        let all = self.convert_matching(window, false, |_| true);
        let mut limited = OccurrenceMap::new();
        let mut remaining = top;
        for (day, occurrences) in all {
            if remaining == 0 {
                break;
            }
            let taken: Vec<Occurrence> = occurrences.into_iter().take(remaining).collect();
            remaining -= taken.len();
            limited.insert(day, taken);
        }
        limited
    }

    fn is_festival_schedule(&self, schedule_type_id: &str) -> bool {
        if schedule_type_id == FESTIVAL_SCHEDULE_TYPE_ID {
            return true;
        }
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.types
            .get(schedule_type_id)
            .is_some_and(|t| t.privilege == Privilege::None)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::model::{RecurrenceKind, RecurrenceRule};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).expect("valid time")
    }

    fn store() -> InMemoryScheduleStore {
        let store = InMemoryScheduleStore::new(Arc::new(LunarCalendarCache::new()));
        store.add_schedule(
            Schedule::new("standup", "work", dt(2024, 2, 5, 9), dt(2024, 2, 5, 10))
                .with_recurrence(RecurrenceRule::new(RecurrenceKind::Workday)),
        );
        store.add_schedule(Schedule::new(
            "dentist",
            "home",
            dt(2024, 2, 7, 15),
            dt(2024, 2, 7, 16),
        ));
        store
    }

    #[test_log::test]
    fn rrule_query_selects_by_recurrence_type() {
        let store = store();
        let window = QueryWindow::from_dates(date(2024, 2, 5), date(2024, 2, 11));
        let work = store.query_schedule_by_rrule(&window, RRuleType::Work);
        assert_eq!(work.values().map(Vec::len).sum::<usize>(), 5);
        let single = store.query_schedule_by_rrule(&window, RRuleType::None);
        assert_eq!(single.keys().copied().collect::<Vec<_>>(), vec![date(2024, 2, 7)]);
        assert!(store.query_schedule_by_rrule(&window, RRuleType::Year).is_empty());
    }

    #[test_log::test]
    fn summary_query_includes_festivals() {
        let store = store();
        let window = QueryWindow::from_dates(date(2024, 2, 9), date(2024, 2, 10));
        let found = store.query_schedule_by_summary(&window, "节");
        let spring = found.get(&date(2024, 2, 10)).expect("spring festival");
        assert_eq!(spring[0].summary, "春节");
        assert!(store.is_festival_schedule(&spring[0].schedule_type_id));
        assert!(!store.is_festival_schedule("work"));

        let plain = InMemoryScheduleStore::new(Arc::new(LunarCalendarCache::new()))
            .with_festival_overlay(false);
        assert!(plain.query_schedule_by_summary(&window, "节").is_empty());
    }

    #[test_log::test]
    fn limit_query_takes_earliest() {
        let store = store();
        let window = QueryWindow::from_dates(date(2024, 2, 1), date(2024, 2, 29));
        let found = store.query_schedule_by_limit(&window, 1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[&date(2024, 2, 5)][0].summary, "standup");
    }

    #[test_log::test]
    fn add_replace_and_remove() {
        let store = store();
        let mut dentist = store
            .document()
            .schedules
            .into_iter()
            .find(|s| s.summary == "dentist")
            .expect("stored");
        dentist.summary = "dentist (moved)".to_string();
        store.add_schedule(dentist.clone());
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.schedule(dentist.id).map(|s| s.summary),
            Some("dentist (moved)".to_string())
        );
        let removed = store.remove_schedule(dentist.id).expect("stored");
        assert_eq!(removed.summary, "dentist (moved)");
        assert!(matches!(
            store.remove_schedule(dentist.id),
            Err(ScheduleError::NotFound(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test_log::test]
    fn document_round_trips_through_disk() {
        let store = store();
        store.add_schedule_type(ScheduleType {
            id: "work".to_string(),
            display_name: "Work".to_string(),
            privilege: Privilege::User,
        });
        let path = std::env::temp_dir().join(format!("almanac-store-{}.json", Uuid::new_v4()));
        store.save(&path).expect("saved");
        let loaded =
            InMemoryScheduleStore::load(Arc::new(LunarCalendarCache::new()), &path).expect("loaded");
        std::fs::remove_file(&path).expect("cleanup");
        assert_eq!(loaded.document(), store.document());
        assert!(loaded.is_festival_schedule(FESTIVAL_SCHEDULE_TYPE_ID));
    }
}
