//! Timestamp parsing for export attributes.
//!
//! Health exports write instants as `2019-10-13 10:15:00 +0200`. RFC 3339
//! strings are accepted as well, since re-exported dumps often use them.

use crate::{Error, Result};
use chrono::{DateTime, FixedOffset};

/// Native export layout
pub const EXPORT_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Parse a timestamp attribute, naming `field` in the error on failure
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    DateTime::parse_from_str(trimmed, EXPORT_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .map_err(|_| Error::MalformedTimestamp {
            field: field.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_export_format() {
        let ts = parse_timestamp("startDate", "2019-10-13 10:15:00 +0200").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(
            ts.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2019, 10, 13, 8, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rfc3339() {
        let ts = parse_timestamp("startDate", "2019-10-13T10:15:00-05:00").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_offset_is_required() {
        let err = parse_timestamp("endDate", "2019-10-13 10:15:00").unwrap_err();
        match err {
            Error::MalformedTimestamp { field, value } => {
                assert_eq!(field, "endDate");
                assert_eq!(value, "2019-10-13 10:15:00");
            }
            other => panic!("Expected MalformedTimestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_timestamp("creationDate", "yesterday").is_err());
    }
}
