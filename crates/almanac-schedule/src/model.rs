use std::collections::{BTreeMap, BTreeSet};

use almanac_core::types::Termination;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Repetition pattern of a schedule. Non-repeating schedules carry no rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecurrenceKind {
    Daily,
    /// Empty `weekdays` repeats on the origin's weekday.
    Weekly {
        #[serde(default)]
        weekdays: Vec<Weekday>,
    },
    /// Empty `days_of_month` repeats on the origin's day of month.
    Monthly {
        #[serde(default)]
        days_of_month: Vec<u32>,
    },
    Yearly,
    /// Monday through Friday.
    Workday,
    /// Saturday and Sunday.
    RestDay,
    LunarMonthly,
    LunarYearly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    #[serde(flatten)]
    pub kind: RecurrenceKind,
    #[serde(default)]
    pub termination: Termination,
    /// Start dates of occurrences removed from the series.
    #[serde(default)]
    pub exclusions: BTreeSet<NaiveDate>,
}

impl RecurrenceRule {
    #[must_use]
    pub const fn new(kind: RecurrenceKind) -> Self {
        Self {
            kind,
            termination: Termination::Never,
            exclusions: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    #[must_use]
    pub fn with_exclusion(mut self, date: NaiveDate) -> Self {
        self.exclusions.insert(date);
        self
    }
}

/// Coarse recurrence tag the store indexes schedules by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RRuleType {
    None,
    Day,
    Work,
    Week,
    Month,
    Year,
}

impl From<Option<&RecurrenceRule>> for RRuleType {
    fn from(rule: Option<&RecurrenceRule>) -> Self {
        let Some(rule) = rule else {
            return Self::None;
        };
        match rule.kind {
            RecurrenceKind::Daily => Self::Day,
            RecurrenceKind::Workday => Self::Work,
            RecurrenceKind::Weekly { .. } | RecurrenceKind::RestDay => Self::Week,
            RecurrenceKind::Monthly { .. } | RecurrenceKind::LunarMonthly => Self::Month,
            RecurrenceKind::Yearly | RecurrenceKind::LunarYearly => Self::Year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub schedule_type_id: String,
    #[serde(default)]
    pub all_day: bool,
    pub dt_start: NaiveDateTime,
    pub dt_end: NaiveDateTime,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
}

impl Schedule {
    #[must_use]
    pub fn new(
        summary: impl Into<String>,
        schedule_type_id: impl Into<String>,
        dt_start: NaiveDateTime,
        dt_end: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            summary: summary.into(),
            description: String::new(),
            schedule_type_id: schedule_type_id.into(),
            all_day: false,
            dt_start,
            dt_end,
            recurrence: None,
        }
    }

    #[must_use]
    pub const fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    #[must_use]
    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.dt_end.signed_duration_since(self.dt_start)
    }

    /// Number of calendar days between the start and end dates.
    #[must_use]
    pub fn span_days(&self) -> i64 {
        self.dt_end
            .date()
            .signed_duration_since(self.dt_start.date())
            .num_days()
    }

    #[must_use]
    pub fn rrule_type(&self) -> RRuleType {
        RRuleType::from(self.recurrence.as_ref())
    }

    /// ## Summary
    /// Materializes the instance starting at `start`, keeping this schedule's duration.
    #[must_use]
    pub fn occurrence_at(&self, start: NaiveDateTime) -> Occurrence {
        let end = start
            .checked_add_signed(self.duration())
            .unwrap_or(start);
        Occurrence {
            schedule_id: self.id,
            summary: self.summary.clone(),
            schedule_type_id: self.schedule_type_id.clone(),
            all_day: self.all_day,
            dt_start: start,
            dt_end: end,
            recurrence_id: (start != self.dt_start).then_some(start),
        }
    }
}

/// Who may edit schedules of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    /// Built-in, read-only overlay such as festivals.
    None,
    Read,
    #[default]
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleType {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub privilege: Privilege,
}

/// One concrete instance of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub schedule_id: Uuid,
    pub summary: String,
    pub schedule_type_id: String,
    pub all_day: bool,
    pub dt_start: NaiveDateTime,
    pub dt_end: NaiveDateTime,
    /// Start of this instance when it is not the series origin.
    pub recurrence_id: Option<NaiveDateTime>,
}

impl Occurrence {
    /// Identity used to de-duplicate instances.
    #[must_use]
    pub const fn instance_id(&self) -> (Uuid, Option<NaiveDateTime>) {
        (self.schedule_id, self.recurrence_id)
    }

    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.dt_end.signed_duration_since(self.dt_start)
    }
}

/// Occurrences grouped by the day they are listed under.
pub type OccurrenceMap = BTreeMap<NaiveDate, Vec<Occurrence>>;

/// Serialized form of a schedule collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    #[serde(default)]
    pub types: Vec<ScheduleType>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}
