use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::{CycletimeError, Result};

const MICROS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1_000_000.0;

/// Parse a tracker timestamp and convert it into `zone`.
///
/// JIRA serializes instants as RFC 3339 with a compact offset
/// (`2025-08-19T06:56:15.157-0400`); plain RFC 3339 and naive timestamps
/// (assumed UTC) are accepted as well. Anything else is an error, never a
/// best-effort default.
pub fn parse_instant(raw: &str, zone: Tz) -> Result<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&zone));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(&zone));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive).with_timezone(&zone));
    }
    Err(CycletimeError::TimestampFormat(raw.to_string()))
}

/// `parse_instant` truncated to the calendar date in `zone`.
pub fn parse_date(raw: &str, zone: Tz) -> Result<NaiveDate> {
    Ok(parse_instant(raw, zone)?.date_naive())
}

/// Parse a user-supplied `MM/DD/YYYY` report date.
pub fn parse_input_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%m/%d/%Y").map_err(|_| {
        CycletimeError::TimestampFormat(format!("{raw}. Example: '12/31/2025'"))
    })
}

/// Format an optional instant as `MM/DD/YYYY`; absent dates render empty.
pub fn format_display_date(instant: Option<&DateTime<Tz>>) -> String {
    instant
        .map(|dt| dt.format("%m/%d/%Y").to_string())
        .unwrap_or_default()
}

/// Round an elapsed duration up to half-day granularity for reporting.
///
/// Sub-second durations report as 0; anything longer reports as at least
/// half a day. Stakeholders track effort in half-day increments, so a
/// positive residual always bumps to the next half day rather than
/// rounding down.
pub fn round_to_half_day(duration: Duration) -> f64 {
    if duration < Duration::seconds(1) {
        return 0.0;
    }

    let micros = duration.num_microseconds().unwrap_or(i64::MAX);
    let days = micros as f64 / MICROS_PER_DAY;
    let rounded = (days * 2.0).ceil() / 2.0;
    rounded.max(0.5)
}

/// Monday-start week spans covering `start` through `end`, inclusive of
/// the week containing each endpoint.
pub fn week_intervals(start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut interval_start = start.week(Weekday::Mon).first_day();
    let mut interval_end = interval_start + Duration::days(6);
    let last_end = end.week(Weekday::Mon).last_day();

    let mut intervals = Vec::new();
    while interval_end <= last_end {
        intervals.push((interval_start, interval_end));
        interval_start = interval_start + Duration::days(7);
        interval_end = interval_start + Duration::days(6);
    }

    intervals
}
