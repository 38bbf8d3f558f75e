//! Error types for rule definitions and external queries

use std::time::Duration;

use thiserror::Error;

/// A malformed rule list, detected before any query runs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleDefinitionError {
    /// A rule was defined with an empty name
    #[error("rule #{0} has an empty name")]
    EmptyName(usize),

    /// Two rules share a name
    #[error("duplicate rule name: {0}")]
    DuplicateName(String),

    /// A rule references a name that no rule defines
    #[error("rule `{rule}` references unknown rule `{reference}`")]
    UnknownReference {
        /// The referencing rule
        rule: String,
        /// The missing name
        reference: String,
    },

    /// A rule references itself or a rule defined after it
    #[error("rule `{rule}` references `{reference}`, which is not defined before it")]
    ForwardReference {
        /// The referencing rule
        rule: String,
        /// The rule referenced too early
        reference: String,
    },

    /// A selection pattern is not a valid glob
    #[error("invalid rule pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Parser message
        message: String,
    },

    /// No rule matched the selection
    #[error("no rule matches {0}")]
    EmptySelection(String),
}

/// Failure of a single external query
///
/// Never aborts a run: the engine turns it into an absent observation or an
/// `Error` result depending on the configured policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The query did not finish in time
    #[error("timed out after {}s: {what}", .after.as_secs())]
    Timeout {
        /// What was being queried
        what: String,
        /// The timeout that elapsed
        after: Duration,
    },

    /// The external system could not be reached or refused the call
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The response could not be parsed into the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl QueryError {
    /// Whether this error means the resource is genuinely absent
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
