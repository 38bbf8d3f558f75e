//! Port traits (interfaces) for external systems
//!
//! These traits define the boundaries between the verification engine and
//! the systems it observes: the cloud resource manager, the cluster API, and
//! plain HTTP endpoints.
//!
//! Implementations live in the `adapters` module. Every port is read-only.

mod cloud;
mod cluster;
mod probe;

pub use cloud::CloudApi;
pub use cluster::ClusterApi;
pub use probe::HttpProbe;
