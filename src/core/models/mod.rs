//! Domain models
//!
//! - [`Rule`] - one fact to verify (query + expectation + remediation)
//! - [`Checklist`] - a validated, ordered rule list
//! - [`RuleResult`] / [`RunSummary`] - outcomes of a run
//! - [`resources`] - typed cloud and cluster response models

mod checklist;
mod outcome;
pub mod resources;
mod rule;
mod status;

pub use checklist::Checklist;
pub use outcome::{RuleResult, RunSummary};
pub use rule::{CloudQuery, ClusterQuery, Expectation, HttpQuery, Input, Query, Rule, System};
pub use status::Status;
