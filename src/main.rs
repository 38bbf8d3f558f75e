//! wiverify - verify an Azure Workload Identity setup against live state
//!
//! Re-queries the cluster, vault, identity, federated credential and
//! Kubernetes objects, compares them to the expected wiring, and exits
//! non-zero when anything does not match.

// Deny all clippy warnings in this crate
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

use std::process::ExitCode;

mod cli;

/// Exit code for configuration and rule definition errors
const EXIT_USAGE: u8 = 2;

/// Main entry point for the wiverify CLI
fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_USAGE)
        },
    }
}
