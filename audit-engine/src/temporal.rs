//! Timestamp handling between the UTC wire format and stored entries
//!
//! Callers exchange timestamps as ISO-8601 strings with an explicit `Z`
//! designator (`2017-03-15T16:57:09.0Z`). Stored entries always carry absolute
//! `DateTime<Utc>` values; `to_local` bridges a parsed lower bound into the
//! offset the repository compares in.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Serializer;

use crate::error::{AuditLogError, Result};

const UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Parse a UTC wire timestamp.
pub fn parse_utc(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), UTC_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            AuditLogError::MalformedTimestamp(format!(
                "'{}' (expected format: YYYY-MM-DDTHH:MM:SS[.fff]Z)",
                s
            ))
        })
}

/// Parse an optional lower bound. Absent or blank input means no bound.
pub fn parse_optional_utc(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match s.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_utc(value).map(Some),
    }
}

/// Re-express an absolute time in the repository's comparison offset.
pub fn to_local(time: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    offset.from_utc_datetime(&time.naive_utc())
}

/// Build the storage offset from a minute count.
pub fn storage_offset(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            AuditLogError::Configuration(format!(
                "UTC offset of {} minutes is out of range",
                minutes
            ))
        })
}

/// Format as the UTC wire format with millisecond precision.
pub fn format_utc(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter writing `DateTime<Utc>` in the wire format.
pub fn serialize_utc<S>(time: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_utc(time))
}
