//! Mock implementations of port traits for testing
//!
//! `MockEnvironment` starts out as a correctly configured workload identity
//! setup. Tests flip individual fields to break one fact at a time.

use std::cell::RefCell;
use std::collections::BTreeMap;

use wiverify::core::error::QueryError;
use wiverify::core::models::resources::{
    Container, Deployment, DeploymentSpec, EnvVar, FederatedCredential, KeyVault,
    KeyVaultProperties, LoadBalancerIngress, ManagedCluster, ManagedIdentity, Namespace,
    ObjectMeta, OidcIssuerProfile, Pod, PodSpec, PodStatus, PodTemplate, RoleAssignment, Secret,
    SecurityProfile, Service, ServiceAccount, WorkloadIdentityProfile,
};
use wiverify::core::ports::{ClusterApi, CloudApi, HttpProbe};
use wiverify::core::services::Identifiers;
use wiverify::core::services::workload_identity::{
    CLIENT_ID_ANNOTATION, SECRETS_USER_ROLE, TOKEN_EXCHANGE_AUDIENCE, USE_LABEL,
};

pub const ISSUER: &str = "https://issuer.example/abc/";
pub const CLIENT_ID: &str = "00000000-0000-0000-0000-00000000c1d0";
pub const PRINCIPAL_ID: &str = "00000000-0000-0000-0000-0000000091d0";
pub const SECRET: &str = "abc123";
pub const EXTERNAL_IP: &str = "20.0.0.1";

/// In-memory cloud, cluster and workload
pub struct MockEnvironment {
    pub ids: Identifiers,
    pub oidc_enabled: bool,
    pub issuer_url: Option<String>,
    pub workload_identity_enabled: bool,
    pub vault_exists: bool,
    pub rbac_authorization: bool,
    pub secret_value: Option<String>,
    pub identity_exists: bool,
    pub role_assigned: bool,
    pub credential_exists: bool,
    pub credential_issuer: String,
    pub credential_subject: String,
    pub audiences: Vec<String>,
    pub namespace_exists: bool,
    pub annotation: Option<String>,
    pub deployment_service_account: String,
    pub use_label: bool,
    pub env_vars: Vec<String>,
    pub pod_phases: Vec<String>,
    pub external_ip: Option<String>,
    pub probe_body: serde_json::Value,
    /// Port methods that fail with `Unavailable`
    pub unavailable: Vec<&'static str>,
    pub(crate) calls: RefCell<Vec<&'static str>>,
}

impl MockEnvironment {
    pub fn healthy() -> Self {
        let ids = Identifiers::default();
        Self {
            oidc_enabled: true,
            issuer_url: Some(ISSUER.to_string()),
            workload_identity_enabled: true,
            vault_exists: true,
            rbac_authorization: true,
            secret_value: Some(SECRET.to_string()),
            identity_exists: true,
            role_assigned: true,
            credential_exists: true,
            credential_issuer: ISSUER.to_string(),
            credential_subject: ids.subject(),
            audiences: vec![TOKEN_EXCHANGE_AUDIENCE.to_string()],
            namespace_exists: true,
            annotation: Some(CLIENT_ID.to_string()),
            deployment_service_account: ids.service_account.clone(),
            use_label: true,
            env_vars: ids.env_vars.clone(),
            pod_phases: vec!["Running".to_string()],
            external_ip: Some(EXTERNAL_IP.to_string()),
            probe_body: serde_json::json!({ "secretValue": SECRET }),
            unavailable: Vec::new(),
            calls: RefCell::new(Vec::new()),
            ids,
        }
    }

    /// Every port method invoked so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    /// Number of times a port method was invoked
    pub fn call_count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == method).count()
    }

    pub fn vault_id(&self) -> String {
        format!(
            "/subscriptions/0000/resourceGroups/{}/providers/Microsoft.KeyVault/vaults/{}",
            self.ids.resource_group, self.ids.vault
        )
    }

    fn enter(&self, method: &'static str) -> Result<(), QueryError> {
        self.calls.borrow_mut().push(method);
        if self.unavailable.contains(&method) {
            return Err(QueryError::Unavailable(format!("{method}: connection reset")));
        }
        Ok(())
    }

    fn meta(&self, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: name.to_string(),
            namespace: Some(self.ids.namespace.clone()),
            ..ObjectMeta::default()
        }
    }
}

fn not_found(what: &str) -> QueryError {
    QueryError::NotFound(what.to_string())
}

impl CloudApi for MockEnvironment {
    fn managed_cluster(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<ManagedCluster, QueryError> {
        self.enter("managed_cluster")?;
        if resource_group != self.ids.resource_group || name != self.ids.cluster {
            return Err(not_found(name));
        }
        Ok(ManagedCluster {
            name: name.to_string(),
            oidc_issuer_profile: Some(OidcIssuerProfile {
                enabled: self.oidc_enabled,
                issuer_url: self.issuer_url.clone(),
            }),
            security_profile: Some(SecurityProfile {
                workload_identity: Some(WorkloadIdentityProfile {
                    enabled: self.workload_identity_enabled,
                }),
            }),
        })
    }

    fn key_vault(&self, _resource_group: &str, name: &str) -> Result<KeyVault, QueryError> {
        self.enter("key_vault")?;
        if !self.vault_exists || name != self.ids.vault {
            return Err(not_found(name));
        }
        Ok(KeyVault {
            id: self.vault_id(),
            name: name.to_string(),
            properties: KeyVaultProperties {
                enable_rbac_authorization: Some(self.rbac_authorization),
                vault_uri: Some(format!("https://{name}.vault.azure.net/")),
            },
        })
    }

    fn secret(&self, vault: &str, name: &str) -> Result<Secret, QueryError> {
        self.enter("secret")?;
        if !self.vault_exists || vault != self.ids.vault || name != self.ids.secret {
            return Err(not_found(name));
        }
        Ok(Secret {
            name: Some(name.to_string()),
            value: self.secret_value.clone(),
        })
    }

    fn managed_identity(
        &self,
        _resource_group: &str,
        name: &str,
    ) -> Result<ManagedIdentity, QueryError> {
        self.enter("managed_identity")?;
        if !self.identity_exists || name != self.ids.identity {
            return Err(not_found(name));
        }
        Ok(ManagedIdentity {
            id: format!("/identities/{name}"),
            name: name.to_string(),
            client_id: Some(CLIENT_ID.to_string()),
            principal_id: Some(PRINCIPAL_ID.to_string()),
        })
    }

    fn role_assignments(
        &self,
        assignee: &str,
        scope: &str,
    ) -> Result<Vec<RoleAssignment>, QueryError> {
        self.enter("role_assignments")?;
        let mut assignments = vec![RoleAssignment {
            role_definition_name: "Reader".to_string(),
            principal_id: Some(assignee.to_string()),
            scope: scope.to_string(),
        }];
        if self.role_assigned && assignee == PRINCIPAL_ID && scope == self.vault_id() {
            assignments.push(RoleAssignment {
                role_definition_name: SECRETS_USER_ROLE.to_string(),
                principal_id: Some(assignee.to_string()),
                scope: scope.to_string(),
            });
        }
        Ok(assignments)
    }

    fn federated_credential(
        &self,
        _resource_group: &str,
        identity: &str,
        name: &str,
    ) -> Result<FederatedCredential, QueryError> {
        self.enter("federated_credential")?;
        if !self.credential_exists || identity != self.ids.identity {
            return Err(not_found(name));
        }
        Ok(FederatedCredential {
            name: name.to_string(),
            issuer: self.credential_issuer.clone(),
            subject: self.credential_subject.clone(),
            audiences: self.audiences.clone(),
        })
    }
}

impl ClusterApi for MockEnvironment {
    fn namespace(&self, name: &str) -> Result<Namespace, QueryError> {
        self.enter("namespace")?;
        if !self.namespace_exists || name != self.ids.namespace {
            return Err(not_found(name));
        }
        Ok(Namespace {
            metadata: ObjectMeta {
                name: name.to_string(),
                ..ObjectMeta::default()
            },
        })
    }

    fn service_account(&self, _namespace: &str, name: &str) -> Result<ServiceAccount, QueryError> {
        self.enter("service_account")?;
        if name != self.ids.service_account {
            return Err(not_found(name));
        }
        let mut metadata = self.meta(name);
        if let Some(client_id) = &self.annotation {
            metadata
                .annotations
                .insert(CLIENT_ID_ANNOTATION.to_string(), client_id.clone());
        }
        Ok(ServiceAccount { metadata })
    }

    fn deployment(&self, _namespace: &str, name: &str) -> Result<Deployment, QueryError> {
        self.enter("deployment")?;
        if name != self.ids.deployment {
            return Err(not_found(name));
        }
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), name.to_string());
        if self.use_label {
            labels.insert(USE_LABEL.to_string(), "true".to_string());
        }
        let env = self
            .env_vars
            .iter()
            .map(|var| EnvVar {
                name: var.clone(),
                value: Some("set".to_string()),
            })
            .collect();

        Ok(Deployment {
            metadata: self.meta(name),
            spec: DeploymentSpec {
                template: PodTemplate {
                    metadata: ObjectMeta {
                        labels,
                        ..ObjectMeta::default()
                    },
                    spec: PodSpec {
                        service_account_name: Some(self.deployment_service_account.clone()),
                        containers: vec![Container {
                            name: "app".to_string(),
                            env,
                        }],
                    },
                },
            },
        })
    }

    fn pods(&self, _namespace: &str, _selector: &str) -> Result<Vec<Pod>, QueryError> {
        self.enter("pods")?;
        Ok(self
            .pod_phases
            .iter()
            .enumerate()
            .map(|(i, phase)| Pod {
                metadata: self.meta(&format!("secret-reader-{i}")),
                status: PodStatus {
                    phase: Some(phase.clone()),
                },
            })
            .collect())
    }

    fn service(&self, _namespace: &str, name: &str) -> Result<Service, QueryError> {
        self.enter("service")?;
        if name != self.ids.service {
            return Err(not_found(name));
        }
        let mut service = Service {
            metadata: self.meta(name),
            ..Service::default()
        };
        if let Some(ip) = &self.external_ip {
            service.status.load_balancer.ingress.push(LoadBalancerIngress {
                ip: Some(ip.clone()),
                hostname: None,
            });
        }
        Ok(service)
    }
}

impl HttpProbe for MockEnvironment {
    fn get_json(&self, url: &str) -> Result<serde_json::Value, QueryError> {
        self.enter("get_json")?;
        match &self.external_ip {
            Some(ip) if url.starts_with(&format!("http://{ip}")) => Ok(self.probe_body.clone()),
            _ => Err(QueryError::Unavailable(format!("{url}: connection refused"))),
        }
    }
}
