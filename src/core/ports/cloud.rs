//! Cloud resource manager port
//!
//! Read-only access to the Azure resources a workload identity setup is
//! made of.

use crate::core::error::QueryError;
use crate::core::models::resources::{
    FederatedCredential, KeyVault, ManagedCluster, ManagedIdentity, RoleAssignment, Secret,
};

/// Read-only cloud resource manager
///
/// Implementations return [`QueryError::NotFound`] when the resource does not
/// exist, and other variants when the query itself could not be completed.
pub trait CloudApi {
    /// Show an AKS managed cluster
    fn managed_cluster(&self, resource_group: &str, name: &str)
    -> Result<ManagedCluster, QueryError>;

    /// Show a Key Vault
    fn key_vault(&self, resource_group: &str, name: &str) -> Result<KeyVault, QueryError>;

    /// Show a Key Vault secret, including its value
    fn secret(&self, vault: &str, name: &str) -> Result<Secret, QueryError>;

    /// Show a user-assigned managed identity
    fn managed_identity(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<ManagedIdentity, QueryError>;

    /// List role assignments of a principal on a scope
    fn role_assignments(
        &self,
        assignee: &str,
        scope: &str,
    ) -> Result<Vec<RoleAssignment>, QueryError>;

    /// Show a federated credential of a managed identity
    fn federated_credential(
        &self,
        resource_group: &str,
        identity: &str,
        name: &str,
    ) -> Result<FederatedCredential, QueryError>;
}
