use chrono::{Duration, NaiveDateTime};

/// Trailing window applied when the config does not set one.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// True when `ts` falls inside the trailing window ending at `now`.
///
/// The same predicate, inverted, drives archival: a document whose date is
/// no longer recent relative to the run's captured `now` gets archived.
pub fn is_recent(ts: NaiveDateTime, now: NaiveDateTime, window: Duration) -> bool {
    ts > now - window
}
