//! Text encodings used by the SQLite tables.
//!
//! Instants are stored as fixed-width UTC strings so that lexical order in
//! SQL equals chronological order. Decimals are stored as their string form.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use quoteflow_core::errors::{Error, Result, ValidationError};

/// Bar timestamps: second precision
pub const BAR_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Queue bookkeeping: microsecond precision for FIFO ordering
pub const QUEUE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_bar_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(BAR_TIMESTAMP_FORMAT).to_string()
}

pub fn format_queue_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(QUEUE_TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value, DATE_FORMAT)?)
}

pub fn decimal_to_text(value: Option<Decimal>) -> Option<String> {
    value.map(|d| d.normalize().to_string())
}

pub fn text_to_decimal(value: Option<&str>) -> Result<Option<Decimal>> {
    value
        .map(|s| {
            Decimal::from_str(s).map_err(|e| {
                Error::from(ValidationError::InvalidInput(format!(
                    "stored decimal '{}': {}",
                    s, e
                )))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bar_timestamps_sort_lexically() {
        let a = format_bar_timestamp(&Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap());
        let b = format_bar_timestamp(&Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
        assert_eq!(a, "2024-01-09T00:00:00Z");
        assert!(a < b);
        assert_eq!(
            parse_timestamp(&b).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_queue_timestamps_keep_microseconds() {
        let t = Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap();
        assert_eq!(format_queue_timestamp(&t), "2024-01-09T00:00:00.000000Z");
        assert!(parse_timestamp("2024-01-09T00:00:00.000123Z").is_ok());
    }

    #[test]
    fn test_decimal_text() {
        assert_eq!(decimal_to_text(Some(dec!(185.640))), Some("185.64".to_string()));
        assert_eq!(text_to_decimal(Some("185.64")).unwrap(), Some(dec!(185.64)));
        assert_eq!(text_to_decimal(None).unwrap(), None);
        assert!(text_to_decimal(Some("abc")).is_err());
    }
}
