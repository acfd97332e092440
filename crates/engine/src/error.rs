//! Shared error types for the engine crate.

use thiserror::Error;

/// Structural problem found while validating an exported session summary.
///
/// Validation collects every issue instead of stopping at the first, so an
/// import flow can show the user the whole list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SummaryIssue {
    #[error("summary must be a JSON object")]
    NotAnObject,

    #[error("summary is missing a timestamp")]
    MissingTimestamp,

    #[error("timestamp is not a parseable ISO-8601 string: {0}")]
    UnparseableTimestamp(String),

    #[error("summary is missing a score object")]
    MissingScore,

    #[error("score field `{0}` is missing or not a number")]
    NonNumericScoreField(&'static str),

    #[error("summary does not match the expected shape: {0}")]
    Shape(String),
}
