use std::io::Write;

use super::ReportWriter;
use crate::models::Fact;

const ICAL_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// iCalendar (RFC 5545) with one VEVENT per fact
pub struct IcalWriter;

fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

fn line<W: Write>(writer: &mut W, content: &str) -> std::io::Result<()> {
    write!(writer, "{}\r\n", content)
}

impl ReportWriter for IcalWriter {
    fn write_report<W: Write>(&self, facts: &[Fact], writer: &mut W) -> std::io::Result<()> {
        line(writer, "BEGIN:VCALENDAR")?;
        line(writer, "VERSION:2.0")?;
        line(writer, "PRODID:-//hamster-cli//hamster-cli//EN")?;

        for fact in facts {
            let (Some(start), Some(end)) = (fact.start, fact.end) else {
                continue;
            };
            line(writer, "BEGIN:VEVENT")?;
            if let Some(id) = fact.id {
                line(writer, &format!("UID:hamster-fact-{}", id))?;
            }
            line(writer, &format!("DTSTART:{}", start.format(ICAL_TIMESTAMP_FORMAT)))?;
            line(writer, &format!("DTEND:{}", end.format(ICAL_TIMESTAMP_FORMAT)))?;
            line(writer, &format!("SUMMARY:{}", escape_text(&fact.activity.name)))?;
            if let Some(category) = fact.category_name() {
                line(writer, &format!("CATEGORIES:{}", escape_text(category)))?;
            }
            if let Some(description) = &fact.description {
                line(writer, &format!("DESCRIPTION:{}", escape_text(description)))?;
            }
            line(writer, "END:VEVENT")?;
        }

        line(writer, "END:VCALENDAR")
    }
}
