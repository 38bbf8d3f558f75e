//! Adapter implementations for port traits
//!
//! This module contains concrete implementations that handle I/O:
//!
//! - [`command`] - Process execution with a per-query timeout
//! - [`az`] - Cloud API via the Azure CLI
//! - [`kubectl`] - Cluster API via kubectl
//! - [`http`] - HTTP probe via reqwest

pub mod az;
pub mod command;
pub mod http;
pub mod kubectl;

pub use az::AzCli;
pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use http::ReqwestProbe;
pub use kubectl::Kubectl;
