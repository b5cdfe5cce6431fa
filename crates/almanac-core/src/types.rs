use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Inclusive `[begin, end]` range of local date-times a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl QueryWindow {
    #[must_use]
    pub const fn new(begin: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { begin, end }
    }

    /// ## Summary
    /// Builds a window covering whole days, from midnight of `first` to
    /// 23:59:59 of `last`.
    #[must_use]
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            begin: first.and_time(NaiveTime::MIN),
            end: last.and_time(end_of_day()),
        }
    }

    /// ## Summary
    /// Window starting at `now` and spanning the given number of months.
    ///
    /// Saturates at the end of the representable range.
    #[must_use]
    pub fn months_from(now: NaiveDateTime, months: u32) -> Self {
        let end = now
            .checked_add_months(Months::new(months))
            .unwrap_or(NaiveDateTime::MAX);
        Self { begin: now, end }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.begin <= self.end
    }

    #[must_use]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.begin <= at && at <= self.end
    }

    /// True when `[start, end]` shares at least one instant with the window.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start <= self.end && end >= self.begin
    }

    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        self.begin.date()
    }

    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        self.end.date()
    }
}

/// How a recurring series ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    #[default]
    Never,
    /// Series stops after this many occurrences, counting the origin.
    AfterCount(u32),
    /// Last date (inclusive) on which an occurrence may start.
    UntilDate(NaiveDate),
}

impl Termination {
    #[must_use]
    pub const fn count(self) -> Option<u32> {
        match self {
            Self::AfterCount(n) => Some(n),
            Self::Never | Self::UntilDate(_) => None,
        }
    }

    #[must_use]
    pub const fn until(self) -> Option<NaiveDate> {
        match self {
            Self::UntilDate(date) => Some(date),
            Self::Never | Self::AfterCount(_) => None,
        }
    }
}

/// 23:59:59, the inclusive end of a calendar day.
#[must_use]
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}
