use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};

/// Maps a post's UTC timestamp onto the local day it was meant for.
pub trait DateReconciler: Send + Sync {
    fn reconcile(&self, created_at: DateTime<Utc>, today: NaiveDate) -> DateTime<Utc>;
}

/// Pushes a post that looks like it belongs to "yesterday" forward to the
/// next UTC midnight.
///
/// Only the day-of-month numbers are compared, so this misfires across month
/// boundaries (a post on the 31st seen on the 1st is left alone) and assumes
/// the local zone is ahead of UTC by less than a day.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayOffsetHeuristic;

impl DateReconciler for DayOffsetHeuristic {
    fn reconcile(&self, created_at: DateTime<Utc>, today: NaiveDate) -> DateTime<Utc> {
        if (created_at.day() as i64) - (today.day() as i64) < 0 {
            created_at + Duration::hours(24 - created_at.hour() as i64)
        } else {
            created_at
        }
    }
}
