//! hamster-cli - a command-line client for personal time tracking
//!
//! This library provides the core functionality for the `hamster` binary:
//! - Configuration file handling and logging setup
//! - SQLite storage with migrations and a repository layer for facts,
//!   activities, categories and tags
//! - Raw fact shorthand parsing and time-range completion
//! - Boolean search expressions to filter facts
//! - Report writers for csv, tsv, ical and xml exports
//!
//! # Example
//!
//! ```no_run
//! use hamster_cli::cli::{report_error, run};
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         std::process::exit(report_error(&e));
//!     }
//! }
//! ```

pub mod config;
pub mod logging;
pub mod db;
pub mod models;
pub mod repo;
pub mod cli;
pub mod utils;
pub mod filter;
pub mod report;
