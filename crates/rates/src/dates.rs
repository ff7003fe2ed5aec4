//! Calendar-day range handling for date-scoped rate lookups.
//!
//! A `YYYY-MM-DD` path segment means the whole of that day in the server's
//! local time zone: `[00:00:00.000, 23:59:59.999]`, both ends inclusive.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use exportdesk_core::{DomainError, DomainResult};

/// Parse a `YYYY-MM-DD` path segment.
pub fn parse_day(s: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| DomainError::validation("expected date in YYYY-MM-DD format"))
}

/// The UTC instants bounding the given local calendar day, both inclusive.
pub fn local_day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid wall clock time");
    (
        local_to_utc(day.and_time(NaiveTime::MIN)),
        local_to_utc(day.and_time(end_of_day)),
    )
}

fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        // DST fold: take the earlier reading
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // DST gap: the wall time does not exist locally, read it as UTC
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}
