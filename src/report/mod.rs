//! Report writers for `hamster export`
//!
//! Each format renders a list of complete facts to any `Write` sink.

pub mod delimited;
pub mod ical;
pub mod xml;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::models::Fact;

pub use delimited::DelimitedWriter;
pub use ical::IcalWriter;
pub use xml::XmlWriter;

/// Timestamp format used inside exported files
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unrecognized export format '{0}'. Use one of: csv, tsv, ical, xml.")]
pub struct UnknownFormatError(pub String);

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
    Ical,
    Xml,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Ical => "ics",
            ExportFormat::Xml => "xml",
        }
    }

    /// Render `facts` to `writer` in this format
    pub fn write_report<W: Write>(&self, facts: &[Fact], writer: &mut W) -> std::io::Result<()> {
        match self {
            ExportFormat::Csv => DelimitedWriter::csv().write_report(facts, writer),
            ExportFormat::Tsv => DelimitedWriter::tsv().write_report(facts, writer),
            ExportFormat::Ical => IcalWriter.write_report(facts, writer),
            ExportFormat::Xml => XmlWriter.write_report(facts, writer),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            "ical" | "ics" => Ok(ExportFormat::Ical),
            "xml" => Ok(ExportFormat::Xml),
            _ => Err(UnknownFormatError(s.to_string())),
        }
    }
}

/// Trait implemented by every report format
pub trait ReportWriter {
    fn write_report<W: Write>(&self, facts: &[Fact], writer: &mut W) -> std::io::Result<()>;
}

/// Write a report file, creating parent directories as needed
pub fn export_to_file(format: ExportFormat, facts: &[Fact], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    format
        .write_report(facts, &mut writer)
        .and_then(|_| writer.flush())
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;

    log::info!("Exported {} facts to {}", facts.len(), path.display());
    Ok(())
}

fn duration_minutes(fact: &Fact) -> i64 {
    fact.delta().map(|d| d.num_minutes()).unwrap_or(0)
}

fn format_timestamp(ts: Option<chrono::NaiveDateTime>) -> String {
    ts.map(|t| t.format(EXPORT_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

fn joined_tags(fact: &Fact) -> String {
    fact.tags.iter().cloned().collect::<Vec<_>>().join(",")
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_str() {
        assert_eq!("csv".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("TSV".parse::<ExportFormat>(), Ok(ExportFormat::Tsv));
        assert_eq!("ical".parse::<ExportFormat>(), Ok(ExportFormat::Ical));
        assert_eq!("xml".parse::<ExportFormat>(), Ok(ExportFormat::Xml));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_to_file_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("export.csv");

        export_to_file(ExportFormat::Csv, &test_support::sample_facts(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
