//! Time-range completion
//!
//! Users rarely type complete start and end timestamps. A [`TimeFrame`] holds
//! whatever date/time components were given and [`complete_timeframe`] fills
//! in the rest relative to the configured *day start*:
//!
//! - missing start date: today
//! - missing start time: day start
//! - missing end date: the day after the start date, or the start date itself
//!   when the day starts at midnight
//! - missing end time: one second before day start
//!
//! An end that still lies before the start afterwards is rejected.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::utils::date::{parse_partial, DateParseError, PartialDateTime};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeFrameError {
    #[error("End ({end}) lies before start ({start}).")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("Date out of supported range.")]
    OutOfRange,
    #[error("Invalid relative time '{0}'. Expected '-<minutes>'.")]
    InvalidOffset(String),
    #[error(transparent)]
    Parse(#[from] DateParseError),
}

/// Partially specified start/end pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeFrame {
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    /// Relative start, `offset` before now. Takes precedence over start date/time.
    pub offset: Option<Duration>,
}

impl TimeFrame {
    pub fn new(start: PartialDateTime, end: PartialDateTime) -> Self {
        Self {
            start_date: start.date,
            start_time: start.time,
            end_date: end.date,
            end_time: end.time,
            offset: None,
        }
    }

    pub fn has_start(&self) -> bool {
        self.start_date.is_some() || self.start_time.is_some() || self.offset.is_some()
    }

    pub fn has_end(&self) -> bool {
        self.end_date.is_some() || self.end_time.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_start() && !self.has_end()
    }

    pub fn set_start(&mut self, start: PartialDateTime) {
        self.start_date = start.date;
        self.start_time = start.time;
        self.offset = None;
    }

    pub fn set_end(&mut self, end: PartialDateTime) {
        self.end_date = end.date;
        self.end_time = end.time;
    }
}

/// Parse a count of minutes for a `-N` offset. Negative or unrepresentable
/// values yield `None`.
pub fn parse_offset_minutes(expr: &str) -> Option<Duration> {
    let minutes: i64 = expr.trim().parse().ok()?;
    if minutes < 0 {
        return None;
    }
    Duration::try_minutes(minutes)
}

/// Resolve only the start of `frame`
pub fn complete_start(
    frame: &TimeFrame,
    day_start: NaiveTime,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, TimeFrameError> {
    match frame.offset {
        Some(offset) => now.checked_sub_signed(offset).ok_or(TimeFrameError::OutOfRange),
        None => {
            let date = frame.start_date.unwrap_or_else(|| now.date());
            let time = frame.start_time.unwrap_or(day_start);
            Ok(date.and_time(time))
        }
    }
}

/// Fill in the missing components of `frame` and return concrete start/end
pub fn complete_timeframe(
    frame: &TimeFrame,
    day_start: NaiveTime,
    now: NaiveDateTime,
) -> Result<(NaiveDateTime, NaiveDateTime), TimeFrameError> {
    let start = complete_start(frame, day_start, now)?;

    let end_date = match frame.end_date {
        Some(date) => date,
        None if day_start == NaiveTime::MIN => start.date(),
        None => start.date().succ_opt().ok_or(TimeFrameError::OutOfRange)?,
    };
    let end_time = frame
        .end_time
        .unwrap_or_else(|| day_start.overflowing_sub_signed(Duration::seconds(1)).0);
    let end = end_date.and_time(end_time);

    if end < start {
        return Err(TimeFrameError::EndBeforeStart { start, end });
    }
    Ok((start, end))
}

/// Parse a time range argument.
///
/// Accepted forms: `START - END`, `START`, and `-N` (start N minutes ago).
/// `START`/`END` are anything [`parse_partial`] accepts. An empty string
/// yields an empty frame.
pub fn parse_time_range(expr: &str) -> Result<TimeFrame, TimeFrameError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Ok(TimeFrame::default());
    }

    if let Some(minutes) = expr.strip_prefix('-') {
        let offset = parse_offset_minutes(minutes)
            .ok_or_else(|| TimeFrameError::InvalidOffset(expr.to_string()))?;
        return Ok(TimeFrame {
            offset: Some(offset),
            ..TimeFrame::default()
        });
    }

    match expr.split_once(" - ") {
        Some((start, end)) => Ok(TimeFrame::new(parse_partial(start)?, parse_partial(end)?)),
        None => Ok(TimeFrame::new(parse_partial(expr)?, PartialDateTime::default())),
    }
}
