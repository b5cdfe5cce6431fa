/// Hard cap on the number of occurrences any recurrence walk may produce.
pub const RECURRENCE_ITERATION_LIMIT: u32 = 3650;

/// Shortest possible lunar year, used as a conservative forward jump.
pub const MIN_LUNAR_YEAR_DAYS: i64 = 353;

/// Lower bound on a lunar month, used when estimating the distance to a target month.
pub const MIN_LUNAR_MONTH_DAYS: i64 = 28;

/// Events spanning more days than this cover every weekday.
pub const WEEKLY_SPAN_COVERS_ALL_DAYS: i64 = 5;

/// Events spanning more days than this cover every day of month.
pub const MONTHLY_SPAN_COVERS_ALL_DAYS: i64 = 30;

pub const ONE_DAY_SECS: i64 = 86_400;

pub const DEFAULT_QUERY_WINDOW_MONTHS: u32 = 6;
pub const DEFAULT_MAX_DAYS_IN_FUTURE: i64 = 180;

/// Schedule type id of the built-in festival overlay.
pub const FESTIVAL_SCHEDULE_TYPE_ID: &str = "festival";
