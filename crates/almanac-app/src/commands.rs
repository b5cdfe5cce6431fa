use std::path::Path;
use std::sync::Arc;

use almanac_core::config::Settings;
use almanac_lunar::day_info::{describe_day, lunar_month_calendar};
use almanac_lunar::festival::{festivals_in_range, filter_day_festivals};
use almanac_lunar::{LunarCalendarCache, LunarDateInfo};
use almanac_schedule::{InMemoryScheduleStore, OccurrenceMap, QueryDescriptor, QueryScheduleProxy};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};

use crate::cli::{Commands, termination};

/// ## Summary
/// Runs one CLI command and renders its result as pretty JSON.
///
/// ## Errors
/// Returns an error for dates outside the lunar table, impossible months,
/// unreadable input files, or an invalid query descriptor.
pub fn execute(command: Commands, settings: &Settings) -> Result<String> {
    let cache = Arc::new(LunarCalendarCache::new());
    let rendered = match command {
        Commands::Lunar { date } => {
            let day = describe_day(&cache, date)
                .with_context(|| format!("{date} is outside the supported lunar range"))?;
            serde_json::to_string_pretty(&day)?
        }
        Commands::Month { year, month, fill } => {
            let view = lunar_month_calendar(&cache, year, month, fill)
                .with_context(|| format!("{year}-{month} is not a valid month"))?;
            serde_json::to_string_pretty(&view)?
        }
        Commands::Festivals { from, to, key } => {
            let mut days = festivals_in_range(&cache, from, to);
            if let Some(key) = key {
                days = filter_day_festivals(&days, &key);
            }
            serde_json::to_string_pretty(&days)?
        }
        Commands::Expand {
            kind,
            origin,
            from,
            to,
            count,
            until,
            duration_days,
        } => {
            let info = LunarDateInfo::new(
                &cache,
                kind.into(),
                termination(count, until),
                duration_days,
            );
            serde_json::to_string_pretty(&info.get_rrule_start_date(from, to, origin))?
        }
        Commands::Query {
            descriptor,
            schedules,
            now,
        } => {
            let schedules = schedules
                .or_else(|| settings.store.schedules_path.clone().map(Into::into));
            let now = now.unwrap_or_else(|| Local::now().naive_local());
            let found = run_query(cache, settings, &descriptor, schedules.as_deref(), now)?;
            serde_json::to_string_pretty(&found)?
        }
    };
    Ok(rendered)
}

fn run_query(
    cache: Arc<LunarCalendarCache>,
    settings: &Settings,
    descriptor_path: &Path,
    schedules_path: Option<&Path>,
    now: NaiveDateTime,
) -> Result<OccurrenceMap> {
    let text = std::fs::read_to_string(descriptor_path)
        .with_context(|| format!("reading query descriptor {}", descriptor_path.display()))?;
    let descriptor: QueryDescriptor = serde_json::from_str(&text)
        .with_context(|| format!("parsing query descriptor {}", descriptor_path.display()))?;
    descriptor.validate()?;

    let store = match schedules_path {
        Some(path) => InMemoryScheduleStore::load(cache, path)
            .with_context(|| format!("loading schedules from {}", path.display()))?,
        None => {
            tracing::info!("No schedule document configured, querying an empty store");
            InMemoryScheduleStore::new(cache)
        }
    }
    .with_festival_overlay(settings.store.festival_overlay);

    let proxy = QueryScheduleProxy::new(&store, &descriptor, now, &settings.query);
    Ok(proxy.query_schedule())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::NaiveDate;

    use super::*;
    use crate::cli::LunarKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("almanac-{}-{name}", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).expect("write temp file");
        path
    }

    fn json(output: &str) -> serde_json::Value {
        serde_json::from_str(output).expect("valid JSON")
    }

    #[test_log::test]
    fn lunar_command_describes_a_day() {
        let out = execute(
            Commands::Lunar {
                date: date(2024, 2, 10),
            },
            &Settings::default(),
        )
        .expect("convertible");
        let value = json(&out);
        assert_eq!(value["lunar_month_name"], "正月");
        assert_eq!(value["zodiac"], "龙");
    }

    #[test_log::test]
    fn lunar_command_rejects_dates_outside_the_table() {
        let result = execute(
            Commands::Lunar {
                date: date(1850, 1, 1),
            },
            &Settings::default(),
        );
        assert!(result.is_err());
    }

    #[test_log::test]
    fn festivals_command_filters_by_key() {
        let out = execute(
            Commands::Festivals {
                from: date(2024, 2, 1),
                to: date(2024, 2, 29),
                key: Some("春".to_string()),
            },
            &Settings::default(),
        )
        .expect("festivals");
        let value = json(&out);
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["date"], "2024-02-10");
    }

    #[test_log::test]
    fn expand_command_lists_numbered_occurrences() {
        let out = execute(
            Commands::Expand {
                kind: LunarKind::LunarYearly,
                origin: date(2024, 2, 10),
                from: date(2024, 1, 1),
                to: date(2026, 12, 31),
                count: None,
                until: None,
                duration_days: 0,
            },
            &Settings::default(),
        )
        .expect("expanded");
        let value = json(&out);
        assert_eq!(value["0"], "2024-02-10");
        assert_eq!(value["1"], "2025-01-29");
        assert_eq!(value["2"], "2026-02-17");
    }

    #[test_log::test]
    fn query_command_reads_descriptor_and_schedules() {
        let schedules = temp_file(
            "schedules.json",
            r#"{"schedules": [{
                "id": "0b7e3f1c-2a01-4c59-9d0e-6a1f4a5e7d1c",
                "summary": "standup",
                "schedule_type_id": "work",
                "dt_start": "2024-06-03T09:00:00",
                "dt_end": "2024-06-03T09:15:00",
                "recurrence": {"kind": "workday", "termination": {"after_count": 3}}
            }]}"#,
        );
        let descriptor = temp_file("descriptor.json", r#"{"repeat_status": "work_day"}"#);
        let now = NaiveDateTime::parse_from_str("2024-06-03 08:00:00", "%Y-%m-%d %H:%M:%S")
            .expect("valid datetime");

        let out = execute(
            Commands::Query {
                descriptor: descriptor.clone(),
                schedules: Some(schedules.clone()),
                now: Some(now),
            },
            &Settings::default(),
        );
        std::fs::remove_file(&schedules).expect("cleanup");
        std::fs::remove_file(&descriptor).expect("cleanup");

        let value = json(&out.expect("query answered"));
        let days: Vec<&String> = value.as_object().expect("map").keys().collect();
        assert_eq!(days, ["2024-06-03", "2024-06-04", "2024-06-05"]);
    }

    #[test_log::test]
    fn query_command_rejects_invalid_descriptor() {
        let descriptor = temp_file("bad.json", r#"{"repeat_nums": [1, 2, 3]}"#);
        let result = execute(
            Commands::Query {
                descriptor: descriptor.clone(),
                schedules: None,
                now: None,
            },
            &Settings::default(),
        );
        std::fs::remove_file(&descriptor).expect("cleanup");
        assert!(result.is_err());
    }
}
