use std::io::{self, Write};

use super::{duration_minutes, format_timestamp, joined_tags, ReportWriter};
use crate::models::Fact;

const HEADERS: [&str; 7] = [
    "start time",
    "end time",
    "activity",
    "category",
    "description",
    "tags",
    "duration minutes",
];

/// Comma or tab separated values, one fact per line after a header row
pub struct DelimitedWriter {
    delimiter: u8,
}

impl DelimitedWriter {
    pub fn csv() -> Self {
        Self { delimiter: b',' }
    }

    pub fn tsv() -> Self {
        Self { delimiter: b'\t' }
    }
}

fn to_io(err: csv::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

impl ReportWriter for DelimitedWriter {
    fn write_report<W: Write>(&self, facts: &[Fact], writer: &mut W) -> io::Result<()> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);
        out.write_record(HEADERS).map_err(to_io)?;

        for fact in facts {
            out.write_record([
                format_timestamp(fact.start),
                format_timestamp(fact.end),
                fact.activity.name.clone(),
                fact.category_name().unwrap_or_default().to_string(),
                fact.description.clone().unwrap_or_default(),
                joined_tags(fact),
                duration_minutes(fact).to_string(),
            ])
            .map_err(to_io)?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::sample_facts;

    fn render(writer: DelimitedWriter) -> String {
        let mut out = Vec::new();
        writer.write_report(&sample_facts(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_csv() {
        let text = render(DelimitedWriter::csv());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "start time,end time,activity,category,description,tags,duration minutes");
        assert_eq!(
            lines[1],
            "2015-12-12 13:00:00,2015-12-12 16:30:00,foo,bar,\"notes, with \"\"quotes\"\"\",\"alpha,beta\",210"
        );
        assert_eq!(lines[2], "2015-12-12 17:00:00,2015-12-12 17:45:00,reading,,,,45");
    }

    #[test]
    fn test_tsv() {
        let text = render(DelimitedWriter::tsv());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0].split('\t').count(), 7);
        assert_eq!(
            lines[1],
            "2015-12-12 13:00:00\t2015-12-12 16:30:00\tfoo\tbar\t\"notes, with \"\"quotes\"\"\"\talpha,beta\t210"
        );
    }
}
