//! Output formatting for human and JSON modes
//!
//! This module provides structured output that can be rendered either as
//! human-readable text or machine-parseable JSON.

use std::io::{self, Write};

use colored::Colorize;
use serde::Serialize;

use crate::core::models::{Checklist, RuleResult, RunSummary, Status};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

/// Report of one verification run
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Tool version
    pub version: String,
    /// When the run started (RFC3339)
    pub started_at: String,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
    /// Config file the run used, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    /// Counts and results
    #[serde(flatten)]
    pub summary: RunSummary,
}

/// One entry of a rule listing
#[derive(Debug, Serialize)]
pub struct RuleInfo {
    /// Rule name
    pub name: String,
    /// Rule title
    pub title: String,
    /// System queried (`cloud`, `cluster`, `http`, `derived`)
    pub system: String,
    /// Query, in display form
    pub query: String,
    /// Expectation, in display form
    pub expectation: String,
    /// Whether a failure fails the run
    pub gating: bool,
    /// Rules this one reads captured values from
    pub depends_on: Vec<String>,
}

/// Result of a rule listing
#[derive(Debug, Serialize)]
pub struct RuleListResult {
    /// Rules, in execution order
    pub rules: Vec<RuleInfo>,
}

/// Generic operation result for simple commands
#[derive(Debug, Serialize)]
pub struct OperationResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

fn marker(status: Status) -> String {
    match status {
        Status::Pass => format!("{}", "[PASS] ".green().bold()),
        Status::Fail => format!("{}", "[FAIL] ".red().bold()),
        Status::Info => format!("{}", "[INFO] ".cyan().bold()),
        Status::Error => format!("{}", "[ERROR]".yellow().bold()),
    }
}

fn write_result(out: &mut impl Write, result: &RuleResult) -> io::Result<()> {
    writeln!(out, "  {} {}  {}", marker(result.status), result.rule, result.title.dimmed())?;

    let absent = "<absent>";
    match result.status {
        Status::Pass => {},
        Status::Info => {
            writeln!(out, "          value: {}", result.observed.as_deref().unwrap_or(absent))?;
        },
        Status::Fail | Status::Error => {
            writeln!(out, "          observed: {}", result.observed.as_deref().unwrap_or(absent))?;
            if let Some(expected) = &result.expected {
                writeln!(out, "          expected: {expected}")?;
            }
            if let Some(detail) = &result.detail {
                writeln!(out, "          detail:   {detail}")?;
            }
            if let Some(hint) = &result.remediation {
                writeln!(out, "          fix:      {hint}")?;
            }
        },
    }
    Ok(())
}

impl RunReport {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => self.render_json(),
        }
    }

    fn render_human(&self) {
        let stdout = io::stdout();
        let _ = self.write_human(&mut stdout.lock());
    }

    fn render_json(&self) {
        println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
    }

    /// Write the human-readable report
    pub fn write_human(&self, out: &mut impl Write) -> io::Result<()> {
        let summary = &self.summary;
        writeln!(out, "Verifying workload identity ({} rules)\n", summary.results.len())?;

        for result in &summary.results {
            write_result(out, result)?;
        }

        writeln!(
            out,
            "\n{} passed, {} failed, {} errors, {} info ({} ms)",
            summary.passed, summary.failed, summary.errors, summary.info, self.duration_ms
        )?;
        if summary.success {
            writeln!(out, "{}", "VERIFIED: all gating rules passed".green().bold())?;
        } else {
            let broken = summary.failed + summary.errors;
            writeln!(out, "{}", format!("NOT VERIFIED: {broken} gating rule(s) did not pass").red().bold())?;
        }
        Ok(())
    }
}

impl RuleListResult {
    /// Describe every rule of a checklist
    #[must_use]
    pub fn from_checklist(checklist: &Checklist) -> Self {
        let rules = checklist
            .rules()
            .iter()
            .map(|rule| RuleInfo {
                name: rule.name.clone(),
                title: rule.title.clone(),
                system: rule.query.system().to_string(),
                query: rule.query.to_string(),
                expectation: rule.expectation.to_string(),
                gating: rule.is_gating(),
                depends_on: rule.references().into_iter().map(String::from).collect(),
            })
            .collect();
        Self { rules }
    }

    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => self.render_json(),
        }
    }

    fn render_human(&self) {
        if self.rules.is_empty() {
            println!("No rules selected.");
            return;
        }

        println!("Rules:\n");
        for r in &self.rules {
            println!("  {}  {}", r.name.bold(), r.title);
            println!("      {} {}  expect {}", r.system, r.query, r.expectation);
            if !r.depends_on.is_empty() {
                println!("      depends on: {}", r.depends_on.join(", "));
            }
        }
    }

    fn render_json(&self) {
        println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
    }
}

impl OperationResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => println!("{}", self.message),
            OutputMode::Json => {
                println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
            },
        }
    }
}
