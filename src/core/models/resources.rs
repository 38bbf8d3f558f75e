//! Typed response models and field accessors
//!
//! These mirror the JSON documents returned by the cloud resource manager
//! (`az ... -o json`) and the cluster API (`kubectl get ... -o json`). Only
//! the fields a rule can observe are modeled; everything else is ignored.
//!
//! Each `*Field` enum is a typed accessor: it names one observable fact of a
//! resource and knows how to read it as an optional string. Empty strings are
//! treated as absent.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

fn present<S: AsRef<str>>(value: Option<S>) -> Option<String> {
    value.map(|v| v.as_ref().to_string()).filter(|v| !v.is_empty())
}

fn flag(value: bool) -> Option<String> {
    Some(value.to_string())
}

// =============================================================================
// Cloud resources
// =============================================================================

/// An AKS managed cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedCluster {
    /// Cluster name
    #[serde(default)]
    pub name: String,
    /// OIDC issuer settings
    #[serde(default)]
    pub oidc_issuer_profile: Option<OidcIssuerProfile>,
    /// Security settings, including workload identity
    #[serde(default)]
    pub security_profile: Option<SecurityProfile>,
}

/// OIDC issuer settings of a managed cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcIssuerProfile {
    /// Whether the issuer is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Public issuer URL
    #[serde(default)]
    pub issuer_url: Option<String>,
}

/// Security settings of a managed cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityProfile {
    /// Workload identity webhook settings
    #[serde(default)]
    pub workload_identity: Option<WorkloadIdentityProfile>,
}

/// Workload identity settings of a managed cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadIdentityProfile {
    /// Whether workload identity is enabled
    #[serde(default)]
    pub enabled: bool,
}

/// Observable facts of a managed cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterField {
    /// `oidcIssuerProfile.enabled`
    OidcIssuerEnabled,
    /// `oidcIssuerProfile.issuerUrl`
    OidcIssuerUrl,
    /// `securityProfile.workloadIdentity.enabled`
    WorkloadIdentityEnabled,
}

impl ClusterField {
    /// Read this field from a cluster document
    #[must_use]
    pub fn extract(self, cluster: &ManagedCluster) -> Option<String> {
        let oidc = cluster.oidc_issuer_profile.as_ref();
        match self {
            Self::OidcIssuerEnabled => flag(oidc.is_some_and(|p| p.enabled)),
            Self::OidcIssuerUrl => present(oidc.and_then(|p| p.issuer_url.as_deref())),
            Self::WorkloadIdentityEnabled => flag(
                cluster
                    .security_profile
                    .as_ref()
                    .and_then(|s| s.workload_identity)
                    .is_some_and(|w| w.enabled),
            ),
        }
    }
}

impl std::fmt::Display for ClusterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OidcIssuerEnabled => write!(f, "oidcIssuerProfile.enabled"),
            Self::OidcIssuerUrl => write!(f, "oidcIssuerProfile.issuerUrl"),
            Self::WorkloadIdentityEnabled => write!(f, "securityProfile.workloadIdentity.enabled"),
        }
    }
}

/// A Key Vault
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyVault {
    /// Full resource id (the role assignment scope)
    #[serde(default)]
    pub id: String,
    /// Vault name
    #[serde(default)]
    pub name: String,
    /// Vault properties
    #[serde(default)]
    pub properties: KeyVaultProperties,
}

/// Properties of a Key Vault
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultProperties {
    /// Whether access is governed by RBAC instead of access policies
    #[serde(default)]
    pub enable_rbac_authorization: Option<bool>,
    /// Data-plane URI
    #[serde(default)]
    pub vault_uri: Option<String>,
}

/// Observable facts of a Key Vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VaultField {
    /// `id`
    Id,
    /// `properties.enableRbacAuthorization`
    RbacAuthorization,
    /// `properties.vaultUri`
    Uri,
}

impl VaultField {
    /// Read this field from a vault document
    #[must_use]
    pub fn extract(self, vault: &KeyVault) -> Option<String> {
        match self {
            Self::Id => present(Some(&vault.id)),
            Self::RbacAuthorization => {
                flag(vault.properties.enable_rbac_authorization.unwrap_or(false))
            },
            Self::Uri => present(vault.properties.vault_uri.as_deref()),
        }
    }
}

impl std::fmt::Display for VaultField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id => write!(f, "id"),
            Self::RbacAuthorization => write!(f, "properties.enableRbacAuthorization"),
            Self::Uri => write!(f, "properties.vaultUri"),
        }
    }
}

/// A Key Vault secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    /// Secret name
    #[serde(default)]
    pub name: Option<String>,
    /// Stored value
    #[serde(default)]
    pub value: Option<String>,
}

/// A user-assigned managed identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedIdentity {
    /// Full resource id
    #[serde(default)]
    pub id: String,
    /// Identity name
    #[serde(default)]
    pub name: String,
    /// Application (client) id
    #[serde(default)]
    pub client_id: Option<String>,
    /// Service principal object id
    #[serde(default)]
    pub principal_id: Option<String>,
}

/// Observable facts of a managed identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityField {
    /// `id`
    Id,
    /// `clientId`
    ClientId,
    /// `principalId`
    PrincipalId,
}

impl IdentityField {
    /// Read this field from an identity document
    #[must_use]
    pub fn extract(self, identity: &ManagedIdentity) -> Option<String> {
        match self {
            Self::Id => present(Some(&identity.id)),
            Self::ClientId => present(identity.client_id.as_deref()),
            Self::PrincipalId => present(identity.principal_id.as_deref()),
        }
    }
}

impl std::fmt::Display for IdentityField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id => write!(f, "id"),
            Self::ClientId => write!(f, "clientId"),
            Self::PrincipalId => write!(f, "principalId"),
        }
    }
}

/// A role assignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    /// Display name of the role definition
    #[serde(default)]
    pub role_definition_name: String,
    /// Assigned principal
    #[serde(default)]
    pub principal_id: Option<String>,
    /// Assignment scope
    #[serde(default)]
    pub scope: String,
}

/// A federated identity credential on a managed identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedCredential {
    /// Credential name
    #[serde(default)]
    pub name: String,
    /// Trusted token issuer
    #[serde(default)]
    pub issuer: String,
    /// Trusted token subject
    #[serde(default)]
    pub subject: String,
    /// Accepted token audiences
    #[serde(default)]
    pub audiences: Vec<String>,
}

/// Observable facts of a federated credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialField {
    /// `name`
    Name,
    /// `issuer`
    Issuer,
    /// `subject`
    Subject,
    /// `audiences`, comma-joined
    Audience,
}

impl CredentialField {
    /// Read this field from a credential document
    #[must_use]
    pub fn extract(self, credential: &FederatedCredential) -> Option<String> {
        match self {
            Self::Name => present(Some(&credential.name)),
            Self::Issuer => present(Some(&credential.issuer)),
            Self::Subject => present(Some(&credential.subject)),
            Self::Audience => present(Some(&credential.audiences.join(","))),
        }
    }
}

impl std::fmt::Display for CredentialField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Issuer => write!(f, "issuer"),
            Self::Subject => write!(f, "subject"),
            Self::Audience => write!(f, "audiences"),
        }
    }
}

// =============================================================================
// Cluster resources
// =============================================================================

/// Kubernetes object metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object name
    #[serde(default)]
    pub name: String,
    /// Owning namespace
    #[serde(default)]
    pub namespace: Option<String>,
    /// Labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// A namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
}

/// A service account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccount {
    /// Metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
}

/// Observable facts of a service account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceAccountField {
    /// `metadata.name`
    Name,
    /// `metadata.annotations[key]`
    Annotation(String),
}

impl ServiceAccountField {
    /// Read this field from a service account document
    #[must_use]
    pub fn extract(&self, account: &ServiceAccount) -> Option<String> {
        match self {
            Self::Name => present(Some(&account.metadata.name)),
            Self::Annotation(key) => {
                present(account.metadata.annotations.get(key).map(String::as_str))
            },
        }
    }
}

impl std::fmt::Display for ServiceAccountField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "metadata.name"),
            Self::Annotation(key) => write!(f, "metadata.annotations[{key}]"),
        }
    }
}

/// A deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state
    #[serde(default)]
    pub spec: DeploymentSpec,
}

/// Desired state of a deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    /// Pod template
    #[serde(default)]
    pub template: PodTemplate,
}

/// Pod template of a deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodTemplate {
    /// Template metadata (labels applied to pods)
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Pod spec
    #[serde(default)]
    pub spec: PodSpec,
}

/// Pod spec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Service account the pods run as
    #[serde(default)]
    pub service_account_name: Option<String>,
    /// Containers
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// A container in a pod spec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Container name
    #[serde(default)]
    pub name: String,
    /// Environment variables
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

/// An environment variable declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Literal value, if not sourced from elsewhere
    #[serde(default)]
    pub value: Option<String>,
}

/// Observable facts of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentField {
    /// `metadata.name`
    Name,
    /// `spec.template.spec.serviceAccountName`
    ServiceAccountName,
    /// `spec.template.metadata.labels[key]`
    PodLabel(String),
    /// Name of an environment variable declared by any container
    EnvVar(String),
}

impl DeploymentField {
    /// Read this field from a deployment document
    #[must_use]
    pub fn extract(&self, deployment: &Deployment) -> Option<String> {
        let template = &deployment.spec.template;
        match self {
            Self::Name => present(Some(&deployment.metadata.name)),
            Self::ServiceAccountName => present(template.spec.service_account_name.as_deref()),
            Self::PodLabel(key) => present(template.metadata.labels.get(key).map(String::as_str)),
            Self::EnvVar(name) => template
                .spec
                .containers
                .iter()
                .flat_map(|c| &c.env)
                .find(|e| &e.name == name)
                .map(|e| e.name.clone()),
        }
    }
}

impl std::fmt::Display for DeploymentField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "metadata.name"),
            Self::ServiceAccountName => write!(f, "spec.template.spec.serviceAccountName"),
            Self::PodLabel(key) => write!(f, "spec.template.metadata.labels[{key}]"),
            Self::EnvVar(name) => write!(f, "spec.template.spec.containers[*].env[{name}]"),
        }
    }
}

/// A pod
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    /// Metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Observed state
    #[serde(default)]
    pub status: PodStatus,
}

/// Observed state of a pod
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodStatus {
    /// Lifecycle phase (`Pending`, `Running`, ...)
    #[serde(default)]
    pub phase: Option<String>,
}

/// The distinct phases of a set of pods, sorted and comma-joined
///
/// A healthy selector yields exactly `Running`. No pods yields `None`.
#[must_use]
pub fn pod_phases(pods: &[Pod]) -> Option<String> {
    let phases: BTreeSet<&str> = pods
        .iter()
        .map(|p| p.status.phase.as_deref().unwrap_or("Unknown"))
        .collect();
    present(Some(&phases.into_iter().collect::<Vec<_>>().join(",")))
}

/// A service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Observed state
    #[serde(default)]
    pub status: ServiceStatus,
}

/// Observed state of a service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// Load balancer state
    #[serde(default)]
    pub load_balancer: LoadBalancerStatus,
}

/// Load balancer state of a service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerStatus {
    /// Provisioned ingress points
    #[serde(default)]
    pub ingress: Vec<LoadBalancerIngress>,
}

/// A load balancer ingress point
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerIngress {
    /// Ingress IP address
    #[serde(default)]
    pub ip: Option<String>,
    /// Ingress host name
    #[serde(default)]
    pub hostname: Option<String>,
}

/// Observable facts of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceField {
    /// `metadata.name`
    Name,
    /// First ingress IP or host name
    ExternalAddress,
}

impl ServiceField {
    /// Read this field from a service document
    #[must_use]
    pub fn extract(self, service: &Service) -> Option<String> {
        match self {
            Self::Name => present(Some(&service.metadata.name)),
            Self::ExternalAddress => service
                .status
                .load_balancer
                .ingress
                .iter()
                .find_map(|i| present(i.ip.as_deref()).or_else(|| present(i.hostname.as_deref()))),
        }
    }
}

impl std::fmt::Display for ServiceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "metadata.name"),
            Self::ExternalAddress => write!(f, "status.loadBalancer.ingress[0]"),
        }
    }
}
