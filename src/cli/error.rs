// Error classification for consistent messages and exit codes

use thiserror::Error;

use crate::cli::parser::RawFactError;
use crate::config::ConfigError;
use crate::filter::ParseError;
use crate::report::UnknownFormatError;
use crate::repo::StoreError;
use crate::utils::{DateParseError, TimeFrameError};

/// User input and state errors raised by the command handlers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("No matching facts found")]
    NoMatchingFacts,
    #[error("Ambiguous edit: --set-activity and --set-category must be given together")]
    AmbiguousEdit,
    #[error("Nothing to edit. Use --set-activity/--set-category, --set-description, --set-start or --set-end.")]
    NothingToEdit,
    #[error("At least one tag is required")]
    NoTags,
    #[error("Invalid tag '{0}'. Tags cannot be empty or contain whitespace.")]
    InvalidTag(String),
}

/// Exit code for user errors (invalid input, missing resources, bad config)
pub const EXIT_USER_ERROR: i32 = 1;
/// Exit code for unexpected failures (database, I/O)
pub const EXIT_INTERNAL_ERROR: i32 = 2;

/// Whether `err` was caused by the user rather than by the system
pub fn is_user_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<CliError>().is_some()
        || err.downcast_ref::<ConfigError>().is_some()
        || err.downcast_ref::<StoreError>().is_some()
        || err.downcast_ref::<TimeFrameError>().is_some()
        || err.downcast_ref::<DateParseError>().is_some()
        || err.downcast_ref::<RawFactError>().is_some()
        || err.downcast_ref::<ParseError>().is_some()
        || err.downcast_ref::<UnknownFormatError>().is_some()
}

/// Print `err` to stderr and return the matching exit code
pub fn report_error(err: &anyhow::Error) -> i32 {
    if is_user_error(err) {
        eprintln!("Error: {}", err);
        return EXIT_USER_ERROR;
    }

    eprintln!("Internal error: {}", err);
    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        eprintln!("\nCaused by:");
        for (indent, cause) in causes.enumerate() {
            eprintln!("{:indent$}  {}", "", cause, indent = indent + 1);
        }
    }
    EXIT_INTERNAL_ERROR
}

/// Validate a tag name given on the command line
pub fn validate_tag(tag: &str) -> Result<(), CliError> {
    if tag.is_empty() || tag.chars().any(char::is_whitespace) {
        Err(CliError::InvalidTag(tag.to_string()))
    } else {
        Ok(())
    }
}
