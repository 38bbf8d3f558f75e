//! Business logic services
//!
//! - [`engine`] - Run a checklist against the ports and summarize
//! - [`workload_identity`] - The workload identity rule set

pub mod engine;
pub mod workload_identity;

pub use engine::{Engine, QueryErrorPolicy};
pub use workload_identity::{Identifiers, rules};
