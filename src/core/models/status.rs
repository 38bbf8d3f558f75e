//! Result status
//!
//! The outcome category of a single evaluated rule.

use serde::{Deserialize, Serialize};

/// Outcome of evaluating one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The expectation held
    Pass,
    /// The expectation did not hold
    Fail,
    /// Observation only, never gates the run
    Info,
    /// The query could not be completed
    Error,
}

impl Status {
    /// Whether this status makes the run unsuccessful
    #[must_use]
    pub const fn is_gating_failure(self) -> bool {
        matches!(self, Self::Fail | Self::Error)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
        }
    }
}
