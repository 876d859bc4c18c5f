// Output formatting utilities

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use std::io::IsTerminal;

use crate::models::{Activity, Fact, TIMESTAMP_FORMAT};

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

const FACT_HEADERS: [&str; 8] = [
    "ID",
    "Start",
    "End",
    "Activity",
    "Category",
    "Tags",
    "Description",
    "Duration",
];
const DESCRIPTION_COLUMN: usize = 6;
const MIN_DESCRIPTION_WIDTH: usize = 11;

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate, with fallback to the COLUMNS environment
/// variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

/// Apply bold formatting if in TTY mode
fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Whole minutes, e.g. `90 min.`
pub fn format_duration(delta: Duration) -> String {
    format!("{} min.", delta.num_minutes())
}

fn format_ts(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Cut `text` to `width` characters, marking the cut with `..`
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(2)).collect();
    format!("{}..", kept)
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

/// Render rows as a space separated table with a header and a dashed rule.
/// Column widths follow the widest cell; `limits` caps individual columns.
fn render_table(headers: &[&str], rows: &[Vec<String>], limits: &[Option<usize>], tty: bool) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    for (i, limit) in limits.iter().enumerate() {
        if let Some(limit) = limit {
            widths[i] = widths[i].min(*limit).max(headers[i].chars().count());
        }
    }

    let mut output = String::new();
    let header: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h, *w))
        .collect();
    output.push_str(bold_if_tty(header.join(" ").trim_end(), tty).as_str());
    output.push('\n');

    let total_width = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
    output.push_str(&format!("{}\n", "-".repeat(total_width)));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad(&truncate(cell, *w), *w))
            .collect();
        output.push_str(cells.join(" ").trim_end());
        output.push('\n');
    }

    output
}

/// Facts table: ID, Start, End, Activity, Category, Tags, Description, Duration
pub fn format_facts_table(facts: &[Fact], tty: bool, terminal_width: usize) -> String {
    if facts.is_empty() {
        return "No facts found.".to_string();
    }

    let rows: Vec<Vec<String>> = facts
        .iter()
        .map(|fact| {
            vec![
                fact.id.map(|id| id.to_string()).unwrap_or_default(),
                format_ts(fact.start),
                format_ts(fact.end),
                fact.activity.name.clone(),
                fact.category_name().unwrap_or_default().to_string(),
                fact.tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" "),
                fact.description.clone().unwrap_or_default(),
                fact.delta().map(format_duration).unwrap_or_default(),
            ]
        })
        .collect();

    // Give the description whatever the other columns leave over
    let fixed: usize = (0..FACT_HEADERS.len())
        .filter(|i| *i != DESCRIPTION_COLUMN)
        .map(|i| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(FACT_HEADERS[i].len()))
                .max()
                .unwrap_or(0)
        })
        .sum::<usize>()
        + FACT_HEADERS.len()
        - 1;
    let description_width = terminal_width.saturating_sub(fixed).max(MIN_DESCRIPTION_WIDTH);

    let mut limits = vec![None; FACT_HEADERS.len()];
    limits[DESCRIPTION_COLUMN] = Some(description_width);

    render_table(&FACT_HEADERS, &rows, &limits, tty)
}

/// Two-column table of activities; uncategorized ones show `unsorted`
pub fn format_activities_table(activities: &[Activity], unsorted: &str, tty: bool) -> String {
    if activities.is_empty() {
        return "No activities found.".to_string();
    }

    let rows: Vec<Vec<String>> = activities
        .iter()
        .map(|activity| {
            vec![
                activity.name.clone(),
                activity
                    .category
                    .as_ref()
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| unsorted.to_string()),
            ]
        })
        .collect();

    render_table(&["Activity", "Category"], &rows, &[None, None], tty)
}

/// The ongoing fact together with its running duration
pub fn format_current(fact: &Fact, now: NaiveDateTime) -> String {
    match fact.delta_until(now) {
        Some(delta) => format!("{} ({})", fact, format_duration(delta)),
        None => fact.to_string(),
    }
}

/// Facts as a pretty-printed JSON array
pub fn format_facts_json(facts: &[Fact]) -> Result<String> {
    serde_json::to_string_pretty(facts).context("Failed to serialize facts")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 12, 12)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample() -> Fact {
        let mut fact = Fact::new(Activity::new("foo", Some(Category::new("bar"))));
        fact.id = Some(7);
        fact.start = Some(at(13, 0));
        fact.end = Some(at(16, 30));
        fact.tags.insert("baz".to_string());
        fact.description = Some("a rather long description of what happened".to_string());
        fact
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(90)), "90 min.");
        assert_eq!(format_duration(Duration::seconds(59)), "0 min.");
    }

    #[test]
    fn test_facts_table_columns() {
        let table = format_facts_table(&[sample()], false, 200);
        let lines: Vec<&str> = table.lines().collect();

        let header: Vec<&str> = lines[0].split_whitespace().collect();
        assert_eq!(header, FACT_HEADERS.to_vec());
        assert!(lines[1].starts_with("---"));
        assert!(lines[2].starts_with("7 "));
        assert!(lines[2].contains("2015-12-12 13:00"));
        assert!(lines[2].contains("2015-12-12 16:30"));
        assert!(lines[2].contains("#baz"));
        assert!(lines[2].contains("a rather long description of what happened"));
        assert!(lines[2].ends_with("210 min."));
    }

    #[test]
    fn test_facts_table_truncates_description() {
        let table = format_facts_table(&[sample()], false, 80);
        assert!(table.contains(".."));
        assert!(!table.contains("what happened"));
    }

    #[test]
    fn test_facts_table_tty_bold_header() {
        let table = format_facts_table(&[sample()], true, 200);
        assert!(table.starts_with(ANSI_BOLD));
    }

    #[test]
    fn test_empty_tables() {
        assert_eq!(format_facts_table(&[], false, 80), "No facts found.");
        assert_eq!(format_activities_table(&[], "Unsorted", false), "No activities found.");
    }

    #[test]
    fn test_activities_table_unsorted() {
        let activities = vec![
            Activity::new("coding", Some(Category::new("work"))),
            Activity::new("reading", None),
        ];
        let table = format_activities_table(&activities, "Unsorted", false);
        assert!(table.contains("coding   work"));
        assert!(table.contains("reading  Unsorted"));
    }

    #[test]
    fn test_current() {
        let mut fact = sample();
        fact.end = None;
        fact.description = None;
        assert_eq!(format_current(&fact, at(14, 0)), "2015-12-12 13:00 foo@bar #baz (60 min.)");
    }

    #[test]
    fn test_json() {
        let json = format_facts_json(&[sample()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["activity"]["name"], "foo");
        assert_eq!(value[0]["id"], 7);
    }
}
