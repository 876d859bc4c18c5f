// Date/time string parsing for command arguments

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unable to parse '{0}' as a date/time. Expected 'YYYY-MM-DD HH:MM', 'YYYY-MM-DD' or 'HH:MM'.")]
pub struct DateParseError(pub String);

/// A date and/or time as typed by the user. Either part may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialDateTime {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl PartialDateTime {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.time.is_none()
    }
}

impl From<NaiveDateTime> for PartialDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            date: Some(dt.date()),
            time: Some(dt.time()),
        }
    }
}

/// Parse `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DD` or `HH:MM[:SS]`
pub fn parse_partial(expr: &str) -> Result<PartialDateTime, DateParseError> {
    let expr = expr.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(expr, format) {
            return Ok(dt.into());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(expr, DATE_FORMAT) {
        return Ok(PartialDateTime { date: Some(date), time: None });
    }

    parse_time_of_day(expr)
        .map(|time| PartialDateTime { date: None, time: Some(time) })
        .ok_or_else(|| DateParseError(expr.to_string()))
}

/// Parse a bare `HH:MM` or `HH:MM:SS`
pub fn parse_time_of_day(expr: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(expr.trim(), format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_datetime() {
        let parsed = parse_partial("2015-12-12 13:00").unwrap();
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2015, 12, 12));
        assert_eq!(parsed.time, NaiveTime::from_hms_opt(13, 0, 0));

        let parsed = parse_partial("2015-12-12 13:00:30").unwrap();
        assert_eq!(parsed.time, NaiveTime::from_hms_opt(13, 0, 30));
    }

    #[test]
    fn test_parse_date_only() {
        let parsed = parse_partial("2015-12-12").unwrap();
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2015, 12, 12));
        assert!(parsed.time.is_none());
    }

    #[test]
    fn test_parse_time_only() {
        let parsed = parse_partial(" 09:15 ").unwrap();
        assert!(parsed.date.is_none());
        assert_eq!(parsed.time, NaiveTime::from_hms_opt(9, 15, 0));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_partial("yesterday-ish").is_err());
        assert!(parse_partial("25:00").is_err());
        assert!(parse_partial("").is_err());
    }
}
