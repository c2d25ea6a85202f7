//! Millisecond timestamp helpers.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};

/// Display format used for message timestamps.
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Map a raw column value to a valid timestamp. Negative values are absent.
pub fn normalize_timestamp(raw: Option<i64>) -> Option<i64> {
    raw.filter(|ts| *ts >= 0)
}

pub fn to_datetime_in<Tz: TimeZone>(tz: &Tz, millis: i64) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(millis).single()
}

/// Format a timestamp in the given zone. Zero and negative values have no
/// display form.
pub fn format_timestamp_in<Tz>(tz: &Tz, millis: i64, format: &str) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if millis <= 0 {
        return None;
    }
    to_datetime_in(tz, millis).map(|dt| dt.format(format).to_string())
}

pub fn format_timestamp(millis: i64) -> Option<String> {
    format_timestamp_in(&Local, millis, DISPLAY_FORMAT)
}

/// First millisecond of `day` in the zone.
pub fn day_start_in<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> i64 {
    local_millis(tz, day, NaiveTime::MIN)
}

/// Last millisecond of `day` in the zone.
pub fn day_end_in<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> i64 {
    match day.succ_opt() {
        Some(next) => local_millis(tz, next, NaiveTime::MIN) - 1,
        None => i64::MAX,
    }
}

fn local_millis<Tz: TimeZone>(tz: &Tz, day: NaiveDate, time: NaiveTime) -> i64 {
    let naive = day.and_time(time);
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.timestamp_millis(),
        // Inside a DST gap; fall back to reading the wall clock as UTC.
        None => naive.and_utc().timestamp_millis(),
    }
}
