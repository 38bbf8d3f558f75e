//! Core domain logic for wiverify
//!
//! This module contains the verification logic with no I/O dependencies.
//! All external interactions are abstracted through port traits.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (Rule, Checklist, RuleResult, RunSummary)
//! - `services/` - The verification engine and the workload identity rules
//! - `ports/` - Trait definitions for the cloud, cluster and HTTP systems
//! - `error` - Rule definition and query errors

pub mod error;
pub mod models;
pub mod ports;
pub mod services;
