use std::io::Write;

use super::{duration_minutes, format_timestamp, joined_tags, ReportWriter};
use crate::models::Fact;

/// Flat XML document: a `<facts>` root with one `<fact/>` element per fact
pub struct XmlWriter;

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#10;"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl ReportWriter for XmlWriter {
    fn write_report<W: Write>(&self, facts: &[Fact], writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
        writeln!(writer, "<facts>")?;
        for fact in facts {
            writeln!(
                writer,
                "  <fact start=\"{}\" end=\"{}\" activity=\"{}\" category=\"{}\" description=\"{}\" tags=\"{}\" duration=\"{}\"/>",
                format_timestamp(fact.start),
                format_timestamp(fact.end),
                escape_attr(&fact.activity.name),
                escape_attr(fact.category_name().unwrap_or_default()),
                escape_attr(fact.description.as_deref().unwrap_or_default()),
                escape_attr(&joined_tags(fact)),
                duration_minutes(fact),
            )?;
        }
        writeln!(writer, "</facts>")
    }
}
