//! Azure CLI adapter
//!
//! Implements [`CloudApi`] by running `az ... -o json` and deserializing the
//! output into the typed resource models.

use serde::de::DeserializeOwned;

use super::command::{CommandRunner, parse_json, stdout_of};
use crate::core::error::QueryError;
use crate::core::models::resources::{
    FederatedCredential, KeyVault, ManagedCluster, ManagedIdentity, RoleAssignment, Secret,
};
use crate::core::ports::CloudApi;

/// `az` CLI backed cloud API
#[derive(Debug)]
pub struct AzCli<R> {
    runner: R,
    subscription: Option<String>,
}

impl<R: CommandRunner> AzCli<R> {
    /// Create an adapter using the CLI's default subscription
    pub const fn new(runner: R) -> Self {
        Self {
            runner,
            subscription: None,
        }
    }

    /// Pin every query to a subscription
    #[must_use]
    pub fn with_subscription(mut self, subscription: Option<String>) -> Self {
        self.subscription = subscription;
        self
    }

    fn query<T: DeserializeOwned>(&self, what: &str, args: &[&str]) -> Result<T, QueryError> {
        let mut argv: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        argv.extend(["--output".to_string(), "json".to_string()]);
        if let Some(subscription) = &self.subscription {
            argv.extend(["--subscription".to_string(), subscription.clone()]);
        }

        let output = self.runner.run("az", &argv)?;
        let stdout = stdout_of(output, what)?;
        parse_json(&stdout, what)
    }
}

impl<R: CommandRunner> CloudApi for AzCli<R> {
    fn managed_cluster(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<ManagedCluster, QueryError> {
        self.query(
            &format!("aks cluster {resource_group}/{name}"),
            &["aks", "show", "--resource-group", resource_group, "--name", name],
        )
    }

    fn key_vault(&self, resource_group: &str, name: &str) -> Result<KeyVault, QueryError> {
        self.query(
            &format!("key vault {resource_group}/{name}"),
            &["keyvault", "show", "--resource-group", resource_group, "--name", name],
        )
    }

    fn secret(&self, vault: &str, name: &str) -> Result<Secret, QueryError> {
        self.query(
            &format!("secret {vault}/{name}"),
            &["keyvault", "secret", "show", "--vault-name", vault, "--name", name],
        )
    }

    fn managed_identity(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<ManagedIdentity, QueryError> {
        self.query(
            &format!("managed identity {resource_group}/{name}"),
            &["identity", "show", "--resource-group", resource_group, "--name", name],
        )
    }

    fn role_assignments(
        &self,
        assignee: &str,
        scope: &str,
    ) -> Result<Vec<RoleAssignment>, QueryError> {
        self.query(
            &format!("role assignments of {assignee}"),
            &["role", "assignment", "list", "--assignee", assignee, "--scope", scope],
        )
    }

    fn federated_credential(
        &self,
        resource_group: &str,
        identity: &str,
        name: &str,
    ) -> Result<FederatedCredential, QueryError> {
        self.query(
            &format!("federated credential {identity}/{name}"),
            &[
                "identity",
                "federated-credential",
                "show",
                "--resource-group",
                resource_group,
                "--identity-name",
                identity,
                "--name",
                name,
            ],
        )
    }
}
