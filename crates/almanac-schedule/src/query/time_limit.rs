//! Resolution of suggested date-times into absolute query windows and
//! time-of-day filters.

use almanac_core::types::{QueryWindow, end_of_day};
use chrono::{NaiveDateTime, NaiveTime, TimeDelta};

use super::descriptor::SuggestDatetime;

/// ## Summary
/// Absolute window a non-repeating query searches.
///
/// No suggestion yields the default look-ahead window. One suggestion with a
/// time is that instant; without a time it is the rest of that day. Two
/// suggestions span from the first (never earlier than `now`) to the second
/// (end of its day when it has no time), clamped to `max_days_in_future`.
///
/// Returns `None` when the request is expired: entirely before today, or
/// starting beyond the furthest allowed day.
#[must_use]
pub fn get_time_limit_by_time_info(
    suggested: &[SuggestDatetime],
    now: NaiveDateTime,
    default_window: QueryWindow,
    max_days_in_future: i64,
) -> Option<QueryWindow> {
    let today = now.date();
    let max_day = now
        .checked_add_signed(TimeDelta::days(max_days_in_future))
        .unwrap_or(NaiveDateTime::MAX)
        .date();

    let window = match suggested {
        [] => default_window,
        [only] => {
            let day = only.datetime.date();
            if day < today || day > max_day {
                tracing::warn!(%day, %today, %max_day, "Suggested day is outside the valid range");
                return None;
            }
            if only.has_time {
                if only.datetime < now {
                    tracing::warn!(suggested = %only.datetime, %now, "Suggested time is in the past");
                    return None;
                }
                QueryWindow::new(only.datetime, only.datetime)
            } else if day == today {
                QueryWindow::new(now, today.and_time(end_of_day()))
            } else {
                QueryWindow::new(only.datetime, day.and_time(end_of_day()))
            }
        }
        [first, second, ..] => {
            if second.datetime.date() < today || first.datetime.date() > max_day {
                tracing::warn!(
                    begin = %first.datetime,
                    end = %second.datetime,
                    "Suggested range is outside the valid range"
                );
                return None;
            }
            let begin = first.datetime.max(now);
            let mut end = if second.has_time {
                second.datetime
            } else {
                second.datetime.date().and_time(end_of_day())
            };
            if end.date() > max_day {
                tracing::debug!(%max_day, "Clamping suggested range end");
                end = max_day.and_time(end_of_day());
            }
            QueryWindow::new(begin, end)
        }
    };
    tracing::debug!(begin = %window.begin, end = %window.end, "Resolved query time limit");
    Some(window)
}

/// ## Summary
/// Time-of-day filter implied by the suggestions: a single timed suggestion
/// is an instant, two suggestions give their times of day.
///
/// Returns `None` when no time filter applies.
#[must_use]
pub fn get_time_filter_by_time_info(suggested: &[SuggestDatetime]) -> Option<(NaiveTime, NaiveTime)> {
    match suggested {
        [only] if only.has_time => Some((only.datetime.time(), only.datetime.time())),
        [first, second, ..] => Some((first.datetime.time(), second.datetime.time())),
        _ => None,
    }
}
