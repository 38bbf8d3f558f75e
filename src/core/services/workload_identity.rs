//! Workload identity rule set
//!
//! The fixed checklist for an AKS workload identity setup: cluster OIDC
//! issuer, Key Vault, managed identity, role assignment, federated
//! credential, then the Kubernetes objects that tie a pod to the identity,
//! and finally an end-to-end probe of the sample service.

use serde::{Deserialize, Serialize};

use crate::core::models::resources::{
    ClusterField, CredentialField, DeploymentField, IdentityField, ServiceAccountField,
    ServiceField, VaultField,
};
use crate::core::models::{
    CloudQuery, ClusterQuery, Expectation, HttpQuery, Input, Query, Rule,
};

/// Annotation linking a service account to a managed identity
pub const CLIENT_ID_ANNOTATION: &str = "azure.workload.identity/client-id";

/// Pod label that opts a workload into token injection
pub const USE_LABEL: &str = "azure.workload.identity/use";

/// Audience of tokens exchanged with Entra ID
pub const TOKEN_EXCHANGE_AUDIENCE: &str = "api://AzureADTokenExchange";

/// Role the identity needs to read secrets
pub const SECRETS_USER_ROLE: &str = "Key Vault Secrets User";

/// Names of rules whose captured values other rules read
pub mod names {
    /// Cluster OIDC issuer URL
    pub const OIDC_ISSUER_URL: &str = "aks.oidc-issuer-url";
    /// Vault resource id
    pub const VAULT_EXISTS: &str = "keyvault.exists";
    /// Stored secret value
    pub const SECRET_VALUE: &str = "keyvault.secret-value";
    /// Identity client id
    pub const CLIENT_ID: &str = "identity.client-id";
    /// Identity principal id
    pub const PRINCIPAL_ID: &str = "identity.principal-id";
    /// Client id annotation on the service account
    pub const ANNOTATION: &str = "k8s.service-account-annotation";
    /// External address of the service
    pub const EXTERNAL_ADDRESS: &str = "service.external-address";
}

/// Names of the resources under verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identifiers {
    /// Resource group holding the cluster, vault and identity
    pub resource_group: String,
    /// AKS cluster name
    pub cluster: String,
    /// Key Vault name
    pub vault: String,
    /// Secret the workload reads
    pub secret: String,
    /// User-assigned managed identity name
    pub identity: String,
    /// Federated credential name on the identity
    pub federated_credential: String,
    /// Kubernetes namespace
    pub namespace: String,
    /// Kubernetes service account
    pub service_account: String,
    /// Deployment running the workload
    pub deployment: String,
    /// Service exposing the workload
    pub service: String,
    /// Label selector for the workload pods
    pub pod_selector: String,
    /// Path of the probe endpoint
    pub probe_path: String,
    /// JSON field of the probe response holding the secret
    pub probe_field: String,
    /// Environment variables the deployment must declare
    pub env_vars: Vec<String>,
}

impl Default for Identifiers {
    fn default() -> Self {
        Self {
            resource_group: "rg-workload-identity".to_string(),
            cluster: "aks-workload-identity".to_string(),
            vault: "kv-workload-identity".to_string(),
            secret: "my-secret".to_string(),
            identity: "id-workload-identity".to_string(),
            federated_credential: "fc-workload-identity".to_string(),
            namespace: "workload-identity".to_string(),
            service_account: "workload-identity-sa".to_string(),
            deployment: "secret-reader".to_string(),
            service: "secret-reader".to_string(),
            pod_selector: "app=secret-reader".to_string(),
            probe_path: "/".to_string(),
            probe_field: "secretValue".to_string(),
            env_vars: vec!["KEYVAULT_URL".to_string(), "SECRET_NAME".to_string()],
        }
    }
}

impl Identifiers {
    /// Subject the federated credential must trust
    #[must_use]
    pub fn subject(&self) -> String {
        format!("system:serviceaccount:{}:{}", self.namespace, self.service_account)
    }
}

/// Build the full rule list, in execution order
#[must_use]
pub fn rules(ids: &Identifiers) -> Vec<Rule> {
    let mut rules = Vec::new();
    rules.extend(cluster_rules(ids));
    rules.extend(vault_rules(ids));
    rules.extend(identity_rules(ids));
    rules.extend(credential_rules(ids));
    rules.extend(kubernetes_rules(ids));
    rules.extend(endpoint_rules(ids));
    rules
}

fn lit(value: &str) -> Input {
    Input::literal(value)
}

fn cluster(ids: &Identifiers, field: ClusterField) -> Query {
    Query::Cloud(CloudQuery::ManagedCluster {
        resource_group: lit(&ids.resource_group),
        name: lit(&ids.cluster),
        field,
    })
}

fn vault(ids: &Identifiers, field: VaultField) -> Query {
    Query::Cloud(CloudQuery::KeyVault {
        resource_group: lit(&ids.resource_group),
        name: lit(&ids.vault),
        field,
    })
}

fn identity(ids: &Identifiers, field: IdentityField) -> Query {
    Query::Cloud(CloudQuery::Identity {
        resource_group: lit(&ids.resource_group),
        name: lit(&ids.identity),
        field,
    })
}

fn credential(ids: &Identifiers, field: CredentialField) -> Query {
    Query::Cloud(CloudQuery::FederatedCredential {
        resource_group: lit(&ids.resource_group),
        identity: lit(&ids.identity),
        name: lit(&ids.federated_credential),
        field,
    })
}

fn deployment(ids: &Identifiers, field: DeploymentField) -> Query {
    Query::Cluster(ClusterQuery::Deployment {
        namespace: lit(&ids.namespace),
        name: lit(&ids.deployment),
        field,
    })
}

fn cluster_rules(ids: &Identifiers) -> Vec<Rule> {
    let (rg, aks) = (&ids.resource_group, &ids.cluster);
    vec![
        Rule::new(
            "aks.oidc-issuer-enabled",
            "Cluster OIDC issuer is enabled",
            cluster(ids, ClusterField::OidcIssuerEnabled),
            Expectation::equals("true"),
        )
        .with_remediation(format!("az aks update -g {rg} -n {aks} --enable-oidc-issuer")),
        Rule::new(
            names::OIDC_ISSUER_URL,
            "Cluster publishes an OIDC issuer URL",
            cluster(ids, ClusterField::OidcIssuerUrl),
            Expectation::NonEmpty,
        )
        .with_remediation(format!("az aks update -g {rg} -n {aks} --enable-oidc-issuer")),
        Rule::new(
            "aks.workload-identity-enabled",
            "Cluster workload identity is enabled",
            cluster(ids, ClusterField::WorkloadIdentityEnabled),
            Expectation::equals("true"),
        )
        .with_remediation(format!("az aks update -g {rg} -n {aks} --enable-workload-identity")),
    ]
}

fn vault_rules(ids: &Identifiers) -> Vec<Rule> {
    let (rg, kv) = (&ids.resource_group, &ids.vault);
    vec![
        Rule::new(
            names::VAULT_EXISTS,
            "Key Vault exists",
            vault(ids, VaultField::Id),
            Expectation::NonEmpty,
        )
        .with_remediation(format!("az keyvault create -g {rg} -n {kv} --enable-rbac-authorization")),
        Rule::new(
            "keyvault.rbac-authorization",
            "Key Vault uses RBAC authorization",
            vault(ids, VaultField::RbacAuthorization),
            Expectation::equals("true"),
        )
        .with_remediation(format!(
            "az keyvault update -g {rg} -n {kv} --enable-rbac-authorization true"
        )),
        Rule::new(
            names::SECRET_VALUE,
            "Stored secret value",
            Query::Cloud(CloudQuery::Secret {
                vault: lit(kv),
                name: lit(&ids.secret),
            }),
            Expectation::Observe,
        ),
    ]
}

fn identity_rules(ids: &Identifiers) -> Vec<Rule> {
    let (rg, id) = (&ids.resource_group, &ids.identity);
    vec![
        Rule::new(
            "identity.exists",
            "Managed identity exists",
            identity(ids, IdentityField::Id),
            Expectation::NonEmpty,
        )
        .with_remediation(format!("az identity create -g {rg} -n {id}")),
        Rule::new(
            names::CLIENT_ID,
            "Managed identity has a client id",
            identity(ids, IdentityField::ClientId),
            Expectation::NonEmpty,
        )
        .with_remediation(format!("az identity show -g {rg} -n {id}")),
        Rule::new(
            names::PRINCIPAL_ID,
            "Managed identity has a principal id",
            identity(ids, IdentityField::PrincipalId),
            Expectation::NonEmpty,
        )
        .with_remediation(format!("az identity show -g {rg} -n {id}")),
        Rule::new(
            "identity.secrets-user-role",
            "Identity can read Key Vault secrets",
            Query::Cloud(CloudQuery::RoleAssignment {
                assignee: Input::captured(names::PRINCIPAL_ID),
                scope: Input::captured(names::VAULT_EXISTS),
                role: lit(SECRETS_USER_ROLE),
            }),
            Expectation::equals(SECRETS_USER_ROLE),
        )
        .with_remediation(format!(
            "az role assignment create --role \"{SECRETS_USER_ROLE}\" \
             --assignee-object-id <principal id> --assignee-principal-type ServicePrincipal \
             --scope <vault id>"
        )),
    ]
}

fn credential_rules(ids: &Identifiers) -> Vec<Rule> {
    let subject = ids.subject();
    let create = format!(
        "az identity federated-credential create -g {} --identity-name {} -n {} \
         --issuer <cluster issuer url> --subject {subject} --audience {TOKEN_EXCHANGE_AUDIENCE}",
        ids.resource_group, ids.identity, ids.federated_credential
    );
    vec![
        Rule::new(
            "credential.exists",
            "Federated credential exists",
            credential(ids, CredentialField::Name),
            Expectation::NonEmpty,
        )
        .with_remediation(create.clone()),
        Rule::new(
            "credential.issuer",
            "Federated credential trusts the cluster issuer",
            credential(ids, CredentialField::Issuer),
            Expectation::matches_captured(names::OIDC_ISSUER_URL),
        )
        .with_remediation(format!(
            "Credential issuer is {{observed}} but the cluster issuer is {{expected}}: {create}"
        )),
        Rule::new(
            "credential.subject",
            "Federated credential trusts the service account",
            credential(ids, CredentialField::Subject),
            Expectation::Equals(subject),
        )
        .with_remediation(format!("Subject is {{observed}}, expected {{expected}}: {create}")),
        Rule::new(
            "credential.audience",
            "Federated credential accepts the token exchange audience",
            credential(ids, CredentialField::Audience),
            Expectation::equals(TOKEN_EXCHANGE_AUDIENCE),
        )
        .with_remediation(format!("Audience is {{observed}}, expected {{expected}}: {create}")),
    ]
}

fn kubernetes_rules(ids: &Identifiers) -> Vec<Rule> {
    let (ns, sa) = (&ids.namespace, &ids.service_account);
    let service_account = |field| {
        Query::Cluster(ClusterQuery::ServiceAccount {
            namespace: lit(ns),
            name: lit(sa),
            field,
        })
    };

    let mut rules = vec![
        Rule::new(
            "k8s.namespace",
            "Namespace exists",
            Query::Cluster(ClusterQuery::Namespace { name: lit(ns) }),
            Expectation::NonEmpty,
        )
        .with_remediation(format!("kubectl create namespace {ns}")),
        Rule::new(
            "k8s.service-account",
            "Service account exists",
            service_account(ServiceAccountField::Name),
            Expectation::NonEmpty,
        )
        .with_remediation(format!("kubectl create serviceaccount {sa} -n {ns}")),
        Rule::new(
            names::ANNOTATION,
            "Service account carries the client id annotation",
            service_account(ServiceAccountField::Annotation(CLIENT_ID_ANNOTATION.to_string())),
            Expectation::NonEmpty,
        )
        .with_remediation(format!(
            "kubectl annotate serviceaccount {sa} -n {ns} {CLIENT_ID_ANNOTATION}=<client id>"
        )),
        Rule::new(
            "k8s.annotation-matches-client-id",
            "Service account annotation matches the identity client id",
            Query::Captured(names::ANNOTATION.to_string()),
            Expectation::matches_captured(names::CLIENT_ID),
        )
        .with_remediation(format!(
            "Annotation is {{observed}} but the client id is {{expected}}: \
             kubectl annotate serviceaccount {sa} -n {ns} --overwrite {CLIENT_ID_ANNOTATION}={{expected}}"
        )),
        Rule::new(
            "deployment.exists",
            "Deployment exists",
            deployment(ids, DeploymentField::Name),
            Expectation::NonEmpty,
        )
        .with_remediation(format!("kubectl apply -n {ns} -f <deployment manifest>")),
        Rule::new(
            "deployment.service-account",
            "Deployment runs as the service account",
            deployment(ids, DeploymentField::ServiceAccountName),
            Expectation::equals(sa.as_str()),
        )
        .with_remediation(format!(
            "Deployment uses {{observed}}; set spec.template.spec.serviceAccountName to {sa}"
        )),
        Rule::new(
            "deployment.workload-identity-label",
            "Pod template opts into workload identity",
            deployment(ids, DeploymentField::PodLabel(USE_LABEL.to_string())),
            Expectation::equals("true"),
        )
        .with_remediation(format!(
            "Add label {USE_LABEL}: \"true\" to spec.template.metadata.labels"
        )),
    ];

    rules.extend(ids.env_vars.iter().map(|var| {
        Rule::new(
            format!("deployment.env.{var}"),
            format!("Deployment declares {var}"),
            deployment(ids, DeploymentField::EnvVar(var.clone())),
            Expectation::NonEmpty,
        )
        .with_remediation(format!("Add {var} to the container env of deployment {}", ids.deployment))
    }));

    rules.push(
        Rule::new(
            "pods.running",
            "Workload pods are running",
            Query::Cluster(ClusterQuery::PodPhase {
                namespace: lit(ns),
                selector: lit(&ids.pod_selector),
            }),
            Expectation::equals("Running"),
        )
        .with_remediation(format!(
            "Pods are {{observed}}: kubectl describe pods -n {ns} -l {}",
            ids.pod_selector
        )),
    );
    rules
}

fn endpoint_rules(ids: &Identifiers) -> Vec<Rule> {
    let (ns, svc) = (&ids.namespace, &ids.service);
    let service = |field| {
        Query::Cluster(ClusterQuery::Service {
            namespace: lit(ns),
            name: lit(svc),
            field,
        })
    };
    vec![
        Rule::new(
            "service.exists",
            "Service exists",
            service(ServiceField::Name),
            Expectation::NonEmpty,
        )
        .with_remediation(format!("kubectl apply -n {ns} -f <service manifest>")),
        Rule::new(
            names::EXTERNAL_ADDRESS,
            "Service has an external address",
            service(ServiceField::ExternalAddress),
            Expectation::NonEmpty,
        )
        .with_remediation(format!("kubectl get service {svc} -n {ns} --watch")),
        Rule::new(
            "probe.secret-value",
            "Workload serves the stored secret",
            Query::Http(HttpQuery {
                address: Input::captured(names::EXTERNAL_ADDRESS),
                path: ids.probe_path.clone(),
                field: ids.probe_field.clone(),
            }),
            Expectation::matches_captured(names::SECRET_VALUE),
        )
        .with_remediation(format!(
            "Endpoint returned {{observed}} but the vault holds {{expected}}: kubectl logs -n {ns} -l {}",
            ids.pod_selector
        )),
    ]
}
