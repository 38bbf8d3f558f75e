//! Cluster API port
//!
//! Read-only access to the Kubernetes objects that wire a workload to its
//! managed identity.

use crate::core::error::QueryError;
use crate::core::models::resources::{Deployment, Namespace, Pod, Service, ServiceAccount};

/// Read-only cluster API
///
/// Implementations return [`QueryError::NotFound`] for missing objects.
/// Listing pods returns an empty list when nothing matches.
pub trait ClusterApi {
    /// Get a namespace
    fn namespace(&self, name: &str) -> Result<Namespace, QueryError>;

    /// Get a service account
    fn service_account(&self, namespace: &str, name: &str) -> Result<ServiceAccount, QueryError>;

    /// Get a deployment
    fn deployment(&self, namespace: &str, name: &str) -> Result<Deployment, QueryError>;

    /// List pods matching a label selector
    fn pods(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>, QueryError>;

    /// Get a service
    fn service(&self, namespace: &str, name: &str) -> Result<Service, QueryError>;
}
