use thiserror::Error;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Iso8601},
    macros::format_description,
};

/// `March 5, 2024`
const LONG_DATE: &[BorrowedFormatItem<'_>] =
    format_description!("[month repr:long] [day padding:none], [year]");

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The timestamp is not a valid ISO-8601 date: {0}")]
pub struct InvalidTimestampError(String);

/// Parses an ISO-8601 timestamp and returns its calendar date in UTC.
///
/// Timestamps without an offset are taken as UTC. A bare date is accepted as well.
pub fn parse_date(timestamp: &str) -> Result<Date, InvalidTimestampError> {
    if let Ok(date_time) = OffsetDateTime::parse(timestamp, &Iso8601::DEFAULT) {
        return Ok(date_time.to_offset(UtcOffset::UTC).date());
    }
    if let Ok(date_time) = PrimitiveDateTime::parse(timestamp, &Iso8601::DEFAULT) {
        return Ok(date_time.date());
    }

    Date::parse(timestamp, &Iso8601::DEFAULT)
        .map_err(|_| InvalidTimestampError(timestamp.to_owned()))
}

/// Formats a timestamp with the full month name, e.g. `March 5, 2024`.
pub fn format_long_date(timestamp: &str) -> Result<String, InvalidTimestampError> {
    parse_date(timestamp)?
        .format(LONG_DATE)
        .map_err(|_| InvalidTimestampError(timestamp.to_owned()))
}
