use thiserror::Error;

/// Lookup and validation failures in the journal.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum JournalError {
    #[error("Symptom not found: {0}")]
    SymptomNotFound(String),

    #[error("Remedy not found: {0}")]
    RemedyNotFound(String),

    #[error("Invalid timestamp '{0}', expected YYYY-MM-DD HH:MM or 'now'")]
    InvalidTimestamp(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD or 'today'")]
    InvalidDate(String),

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("{0} name cannot be empty")]
    EmptyName(&'static str),

    #[error("Potency 'Other' needs a custom potency label")]
    MissingCustomPotency,

    #[error("Identifier '{0}' matches more than one entry")]
    AmbiguousId(String),
}
