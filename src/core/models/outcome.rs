//! Rule results and run summaries

use serde::Serialize;

use super::Status;

/// Outcome of evaluating one rule in one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleResult {
    /// Rule name
    pub rule: String,
    /// Rule title
    pub title: String,
    /// Outcome
    pub status: Status,
    /// Observed value (`None` when absent)
    pub observed: Option<String>,
    /// Expected value, in display form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Extra context (query error, skipped input, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Remediation hint, only set on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl RuleResult {
    /// Whether this result makes the run unsuccessful
    #[must_use]
    pub const fn is_gating_failure(&self) -> bool {
        self.status.is_gating_failure()
    }
}

/// Aggregate of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Rules whose expectation held
    pub passed: usize,
    /// Rules whose expectation did not hold
    pub failed: usize,
    /// Rules whose query could not be completed
    pub errors: usize,
    /// Observation-only rules
    pub info: usize,
    /// True iff no rule failed or errored
    pub success: bool,
    /// Every result, in rule order
    pub results: Vec<RuleResult>,
}

impl RunSummary {
    /// Count statuses over an ordered result list
    #[must_use]
    pub fn from_results(results: Vec<RuleResult>) -> Self {
        let count = |status: Status| results.iter().filter(|r| r.status == status).count();
        let passed = count(Status::Pass);
        let failed = count(Status::Fail);
        let errors = count(Status::Error);
        let info = count(Status::Info);

        Self {
            passed,
            failed,
            errors,
            info,
            success: failed == 0 && errors == 0,
            results,
        }
    }

    /// Process exit code: 0 on success, 1 otherwise
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.success { 0 } else { 1 }
    }

    /// Result for a rule, if it ran
    #[must_use]
    pub fn result(&self, rule: &str) -> Option<&RuleResult> {
        self.results.iter().find(|r| r.rule == rule)
    }
}
