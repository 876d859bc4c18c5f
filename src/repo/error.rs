use chrono::NaiveDateTime;
use thiserror::Error;

/// Predictable store failures caused by user input or the current state
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("There already is an ongoing fact ({0}). Stop or cancel it first.")]
    OngoingFactExists(String),
    #[error("Nothing tracked right now. There is no ongoing fact.")]
    NoOngoingFact,
    #[error("Fact #{0} not found")]
    FactNotFound(i64),
    #[error("A fact needs a start time.")]
    MissingStart,
    #[error("Activity name cannot be empty")]
    EmptyActivity,
    #[error("Fact end ({end}) lies before its start ({start}).")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("Fact lasts {actual} seconds, less than the configured minimum of {min} seconds.")]
    FactTooShort { actual: i64, min: i64 },
}
