//! Scheduling time helpers.
//!
//! Users author instants in Indian Standard Time (UTC+05:30, no DST) while
//! everything stored or compared is UTC. All functions here are pure.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};

pub const IST_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// Lead time a post must have when it is scheduled.
pub const MIN_SCHEDULE_LEAD_MINUTES: i64 = 5;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECONDS).expect("IST offset is in range")
}

/// Interprets a wall-clock IST time and returns the matching UTC instant.
pub fn to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    (local - Duration::seconds(IST_OFFSET_SECONDS as i64)).and_utc()
}

pub fn to_local(utc: DateTime<Utc>) -> DateTime<FixedOffset> {
    utc.with_timezone(&ist())
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn minimum_schedulable() -> DateTime<Utc> {
    minimum_schedulable_from(now())
}

pub fn minimum_schedulable_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(MIN_SCHEDULE_LEAD_MINUTES)
}

pub fn is_due(scheduled: DateTime<Utc>, reference: DateTime<Utc>) -> bool {
    scheduled <= reference
}

/// Rejects instants earlier than `now + 5 minutes`.
pub fn ensure_schedulable(instant: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<()> {
    let floor = minimum_schedulable_from(now);
    if instant < floor {
        return Err(AppError::ValidationError(format!(
            "Scheduled time must be at least {MIN_SCHEDULE_LEAD_MINUTES} minutes in the future (earliest {})",
            format_display(floor)
        )));
    }
    Ok(())
}

/// Accepts RFC 3339 with an explicit offset, or a naive date-time taken as IST.
pub fn parse_schedule_input(input: &str) -> AppResult<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Ok(to_utc(naive));
        }
    }
    Err(AppError::ValidationError(format!(
        "Invalid scheduled time: {input}"
    )))
}

/// Display string cached next to the UTC instant, e.g. `16/10/2026, 02:30:00 PM IST`.
pub fn format_display(utc: DateTime<Utc>) -> String {
    format!("{} IST", to_local(utc).format("%d/%m/%Y, %I:%M:%S %p"))
}
