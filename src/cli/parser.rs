// Raw fact shorthand parsing
//
//   [TIME] activity[@category] [#tag ...][, description]
//
// TIME is `HH:MM` (start today), `HH:MM-HH:MM` (start and end today) or
// `-N` (started N minutes ago).

use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::utils::{parse_offset_minutes, parse_time_of_day, PartialDateTime, TimeFrame};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RawFactError {
    #[error("No fact given. Expected something like 'activity@category #tag, description'.")]
    Empty,
    #[error("Unable to extract an activity name from '{0}'.")]
    MissingActivity(String),
    #[error("Invalid time '{0}' in fact. Expected 'HH:MM', 'HH:MM-HH:MM' or '-<minutes>'.")]
    InvalidTime(String),
}

/// Structured result of parsing the shorthand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFact {
    pub activity: String,
    pub category: Option<String>,
    pub tags: BTreeSet<String>,
    pub description: Option<String>,
    /// Only the parts the shorthand specified; the rest is completed later
    pub timeframe: TimeFrame,
}

fn looks_like_time(token: &str) -> bool {
    token.starts_with('-') || (token.chars().next().map_or(false, |c| c.is_ascii_digit()) && token.contains(':'))
}

fn parse_time_token(token: &str, now: NaiveDateTime) -> Result<TimeFrame, RawFactError> {
    let invalid = || RawFactError::InvalidTime(token.to_string());
    let today = Some(now.date());

    if let Some(minutes) = token.strip_prefix('-') {
        let offset = parse_offset_minutes(minutes).ok_or_else(invalid)?;
        return Ok(TimeFrame {
            offset: Some(offset),
            ..TimeFrame::default()
        });
    }

    match token.split_once('-') {
        Some((start, end)) => {
            let start = parse_time_of_day(start).ok_or_else(invalid)?;
            let end = parse_time_of_day(end).ok_or_else(invalid)?;
            Ok(TimeFrame::new(
                PartialDateTime { date: today, time: Some(start) },
                PartialDateTime { date: today, time: Some(end) },
            ))
        }
        None => {
            let start = parse_time_of_day(token).ok_or_else(invalid)?;
            Ok(TimeFrame::new(
                PartialDateTime { date: today, time: Some(start) },
                PartialDateTime::default(),
            ))
        }
    }
}

/// Parse `raw` into its components. Shorthand times refer to the day of `now`.
pub fn parse_raw_fact(raw: &str, now: NaiveDateTime) -> Result<RawFact, RawFactError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RawFactError::Empty);
    }

    let (head, description) = match raw.split_once(',') {
        Some((head, description)) => (head, Some(description.trim().to_string()).filter(|d| !d.is_empty())),
        None => (raw, None),
    };

    let mut tokens = head.split_whitespace().peekable();
    let timeframe = match tokens.peek() {
        Some(token) if looks_like_time(token) => {
            let frame = parse_time_token(token, now)?;
            tokens.next();
            frame
        }
        _ => TimeFrame::default(),
    };

    let mut tags = BTreeSet::new();
    let mut name_parts = Vec::new();
    for token in tokens {
        match token.strip_prefix('#') {
            Some(tag) if !tag.is_empty() => {
                tags.insert(tag.to_string());
            }
            Some(_) => {}
            None => name_parts.push(token),
        }
    }

    let name = name_parts.join(" ");
    let (activity, category) = match name.split_once('@') {
        Some((activity, category)) => (
            activity.trim().to_string(),
            Some(category.trim().to_string()).filter(|c| !c.is_empty()),
        ),
        None => (name.trim().to_string(), None),
    };
    if activity.is_empty() {
        return Err(RawFactError::MissingActivity(raw.to_string()));
    }

    Ok(RawFact {
        activity,
        category,
        tags,
        description,
        timeframe,
    })
}
