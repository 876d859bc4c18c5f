//! Logging setup
//!
//! Log records go through the `log` facade. The `[client]` config decides the
//! level and the sinks: stderr when `log_console` is set, and/or an appended
//! log file.

use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::{File, OpenOptions};
use std::io::Write;

use crate::config::ClientConfig;

/// Writes every record to stderr and/or a log file
struct LogSink {
    console: bool,
    file: Option<File>,
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.console {
            std::io::stderr().write_all(buf)?;
        }
        if let Some(file) = &mut self.file {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if self.console {
            std::io::stderr().flush()?;
        }
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

/// Install the global logger. Does nothing when no sink is configured.
pub fn init(config: &ClientConfig) -> Result<()> {
    let file = match &config.logfile_path {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?,
        ),
        None => None,
    };

    if !config.log_console && file.is_none() {
        return Ok(());
    }

    let sink = LogSink {
        console: config.log_console,
        file,
    };

    // The config decides the level, RUST_LOG is ignored
    env_logger::Builder::new()
        .filter_level(config.log_level)
        .filter_module("rusqlite", LevelFilter::Warn)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} {}: {}",
                record.level(),
                buf.timestamp_seconds(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(sink)))
        .try_init()
        .context("Failed to initialize logger")?;

    Ok(())
}
