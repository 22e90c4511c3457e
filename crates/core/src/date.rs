//! Calendar date parsing for client-supplied values.

use crate::error::{Error, Result};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Parse a client-supplied date, normalizing timestamps to their calendar date.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps. A timestamp keeps the date of
/// its own offset, so `2024-03-01T23:30:00-05:00` is March 1st.
pub fn parse_calendar_date(input: &str) -> Result<Date> {
    let trimmed = input.trim();
    if let Ok(date) = Date::parse(trimmed, format_description!("[year]-[month]-[day]")) {
        return Ok(date);
    }
    OffsetDateTime::parse(trimmed, &Rfc3339)
        .map(|ts| ts.date())
        .map_err(|_| Error::InvalidDate(input.to_string()))
}

/// Parse an optional date field, treating blank strings as absent.
pub fn parse_optional_date(input: Option<&str>) -> Result<Option<Date>> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_calendar_date(value).map(Some),
    }
}
