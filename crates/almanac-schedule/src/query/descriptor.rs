use almanac_core::error::{CoreError, CoreResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which repetition the user asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatStatus {
    #[default]
    None,
    EveryDay,
    EveryWeek,
    EveryMonth,
    EveryYear,
    RestDay,
    WorkDay,
}

/// Which subset of matching schedules to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    None,
    All,
    Next,
    Last,
}

/// A date-time the user mentioned, and whether the time part was explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestDatetime {
    pub datetime: NaiveDateTime,
    #[serde(default)]
    pub has_time: bool,
}

impl SuggestDatetime {
    #[must_use]
    pub const fn new(datetime: NaiveDateTime, has_time: bool) -> Self {
        Self { datetime, has_time }
    }
}

/// Parsed natural-language schedule query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    #[serde(default)]
    pub repeat_status: RepeatStatus,
    #[serde(default)]
    pub property_status: PropertyStatus,
    /// Weekday (1 = Monday .. 7 = Sunday) or day-of-month bounds; 0 is unspecified.
    #[serde(default)]
    pub repeat_nums: Vec<u32>,
    #[serde(default)]
    pub suggested: Vec<SuggestDatetime>,
    /// Substring the schedule title must contain; empty matches everything.
    #[serde(default)]
    pub title: String,
}

impl QueryDescriptor {
    /// ## Summary
    /// Checks the descriptor's shape before dispatch.
    ///
    /// ## Errors
    /// Returns a validation error when more than two suggested date-times or
    /// repeat numbers are given, or a repeat number is out of range for the
    /// repeat status.
    pub fn validate(&self) -> CoreResult<()> {
        if self.suggested.len() > 2 {
            return Err(CoreError::ValidationError(format!(
                "expected at most 2 suggested date-times, got {}",
                self.suggested.len()
            )));
        }
        if self.repeat_nums.len() > 2 {
            return Err(CoreError::ValidationError(format!(
                "expected at most 2 repeat numbers, got {}",
                self.repeat_nums.len()
            )));
        }
        let max = match self.repeat_status {
            RepeatStatus::EveryWeek => 7,
            RepeatStatus::EveryMonth => 31,
            _ => return Ok(()),
        };
        if let Some(bad) = self.repeat_nums.iter().find(|n| **n > max) {
            return Err(CoreError::ValidationError(format!(
                "repeat number {bad} exceeds {max} for {:?}",
                self.repeat_status
            )));
        }
        Ok(())
    }

    /// `(begin, end)` bounds from the repeat numbers; a single number is both.
    #[must_use]
    pub fn repeat_range(&self) -> (u32, u32) {
        match self.repeat_nums.as_slice() {
            [] => (0, 0),
            [only] => (*only, *only),
            [begin, end, ..] => (*begin, *end),
        }
    }

    /// True when no suggestions are given, or the second does not precede the first.
    #[must_use]
    pub fn time_frame_is_valid(&self) -> bool {
        match self.suggested.as_slice() {
            [first, second] => first.datetime <= second.datetime,
            _ => true,
        }
    }
}
