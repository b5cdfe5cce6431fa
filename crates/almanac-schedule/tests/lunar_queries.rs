//! Lunar-recurring schedules loaded from a document and answered through the query proxy.

use std::sync::Arc;

use almanac_core::config::Settings;
use almanac_lunar::LunarCalendarCache;
use almanac_schedule::{
    InMemoryScheduleStore, OccurrenceMap, PropertyStatus, QueryDescriptor, QueryScheduleProxy,
    RepeatStatus, ScheduleDocument, SuggestDatetime,
};
use chrono::{NaiveDate, NaiveDateTime};

const DOCUMENT: &str = r#"{
    "types": [
        {"id": "home", "display_name": "Home", "privilege": "user"}
    ],
    "schedules": [
        {
            "id": "6a1f4a5e-7d1c-4c59-9d0e-0b7e3f1c2a01",
            "summary": "new moon offering",
            "schedule_type_id": "home",
            "dt_start": "2024-06-06T07:00:00",
            "dt_end": "2024-06-06T08:00:00",
            "recurrence": {"kind": "lunar_monthly"}
        },
        {
            "id": "6a1f4a5e-7d1c-4c59-9d0e-0b7e3f1c2a02",
            "summary": "grandma birthday",
            "schedule_type_id": "home",
            "dt_start": "1990-09-05T18:00:00",
            "dt_end": "1990-09-05T21:00:00",
            "recurrence": {"kind": "lunar_yearly"}
        },
        {
            "id": "6a1f4a5e-7d1c-4c59-9d0e-0b7e3f1c2a03",
            "summary": "football",
            "schedule_type_id": "home",
            "dt_start": "2024-06-08T15:00:00",
            "dt_end": "2024-06-08T17:00:00",
            "recurrence": {"kind": "weekly", "weekdays": ["Sat"]}
        }
    ]
}"#;

fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, 0, 0))
        .expect("valid datetime")
}

fn store() -> InMemoryScheduleStore {
    let document: ScheduleDocument = serde_json::from_str(DOCUMENT).expect("valid document");
    InMemoryScheduleStore::from_document(Arc::new(LunarCalendarCache::new()), document)
}

fn run(store: &InMemoryScheduleStore, descriptor: &QueryDescriptor) -> OccurrenceMap {
    let config = Settings::default().query;
    // Monday 2024-06-03, so the default window ends 2024-12-03.
    QueryScheduleProxy::new(store, descriptor, dt(2024, 6, 3, 8), &config).query_schedule()
}

fn starts(map: &OccurrenceMap) -> Vec<NaiveDateTime> {
    map.values().flatten().map(|o| o.dt_start).collect()
}

#[test_log::test]
fn lunar_monthly_schedule_answers_monthly_queries() {
    let store = store();
    let descriptor = QueryDescriptor {
        repeat_status: RepeatStatus::EveryMonth,
        ..QueryDescriptor::default()
    };
    assert_eq!(
        starts(&run(&store, &descriptor)),
        vec![
            dt(2024, 6, 6, 7),
            dt(2024, 7, 6, 7),
            dt(2024, 8, 4, 7),
            dt(2024, 9, 3, 7),
            dt(2024, 10, 3, 7),
            dt(2024, 11, 1, 7),
            dt(2024, 12, 1, 7),
        ]
    );
}

#[test_log::test]
fn monthly_day_range_applies_to_solar_days() {
    let store = store();
    let descriptor = QueryDescriptor {
        repeat_status: RepeatStatus::EveryMonth,
        repeat_nums: vec![1, 5],
        ..QueryDescriptor::default()
    };
    assert_eq!(
        starts(&run(&store, &descriptor)),
        vec![
            dt(2024, 8, 4, 7),
            dt(2024, 9, 3, 7),
            dt(2024, 10, 3, 7),
            dt(2024, 11, 1, 7),
            dt(2024, 12, 1, 7),
        ]
    );
}

#[test_log::test]
fn lunar_birthday_answers_yearly_queries() {
    let store = store();
    let descriptor = QueryDescriptor {
        repeat_status: RepeatStatus::EveryYear,
        ..QueryDescriptor::default()
    };
    let found = run(&store, &descriptor);
    let birthday: Vec<_> = found.values().flatten().collect();
    assert_eq!(birthday.len(), 1);
    // Lunar 7/17 falls on 2024-08-20.
    assert_eq!(birthday[0].dt_start, dt(2024, 8, 20, 18));
    assert_eq!(birthday[0].dt_end, dt(2024, 8, 20, 21));
    assert_eq!(birthday[0].recurrence_id, Some(dt(2024, 8, 20, 18)));
}

#[test_log::test]
fn title_search_inside_a_suggested_range_finds_lunar_instances() {
    let store = store();
    let descriptor = QueryDescriptor {
        property_status: PropertyStatus::All,
        title: "birthday".to_string(),
        suggested: vec![
            SuggestDatetime::new(dt(2024, 8, 1, 0), false),
            SuggestDatetime::new(dt(2024, 8, 31, 0), false),
        ],
        ..QueryDescriptor::default()
    };
    assert_eq!(starts(&run(&store, &descriptor)), vec![dt(2024, 8, 20, 18)]);
}

#[test_log::test]
fn rest_day_query_ignores_lunar_series() {
    let store = store();
    let descriptor = QueryDescriptor {
        repeat_status: RepeatStatus::RestDay,
        ..QueryDescriptor::default()
    };
    let found = run(&store, &descriptor);
    assert!(!found.is_empty());
    assert!(found.values().flatten().all(|o| o.summary == "football"));
}
