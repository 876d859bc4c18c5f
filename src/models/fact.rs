use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Display format for fact timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Category model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// Activity model
///
/// `(name, category)` identifies an activity: the same name under two
/// categories is two distinct activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Option<i64>,
    pub name: String,
    pub category: Option<Category>,
}

impl Activity {
    pub fn new(name: impl Into<String>, category: Option<Category>) -> Self {
        Self {
            id: None,
            name: name.into(),
            category,
        }
    }
}

/// Fact model
///
/// A fact without an end time is the ongoing fact. There is at most one of
/// those at any time and it is held by the backend's ongoing slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub id: Option<i64>,
    pub activity: Activity,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
}

impl Fact {
    /// Create a new, unsaved fact without any time information
    pub fn new(activity: Activity) -> Self {
        Self {
            id: None,
            activity,
            start: None,
            end: None,
            description: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn category(&self) -> Option<&Category> {
        self.activity.category.as_ref()
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category().map(|c| c.name.as_str())
    }

    pub fn is_ongoing(&self) -> bool {
        self.end.is_none()
    }

    /// Duration of a fact with both start and end set
    pub fn delta(&self) -> Option<Duration> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Duration measured against `now` for facts that are still running
    pub fn delta_until(&self, now: NaiveDateTime) -> Option<Duration> {
        self.delta()
            .or_else(|| self.start.map(|start| now - start))
    }

    /// `activity@category`, or just the activity when uncategorized
    pub fn serialized_name(&self) -> String {
        match self.category_name() {
            Some(category) => format!("{}@{}", self.activity.name, category),
            None => self.activity.name.clone(),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self
            .start
            .map(|s| s.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default();
        match self.end {
            Some(end) => write!(f, "{} to {} {}", start, end.format(TIMESTAMP_FORMAT), self.serialized_name())?,
            None => write!(f, "{} {}", start, self.serialized_name())?,
        }
        for tag in &self.tags {
            write!(f, " #{}", tag)?;
        }
        if let Some(description) = &self.description {
            write!(f, ", {}", description)?;
        }
        Ok(())
    }
}
