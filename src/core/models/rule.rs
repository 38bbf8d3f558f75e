//! Rule model
//!
//! A rule declares one fact about the infrastructure: "query this, expect
//! that, and if it does not hold, tell the operator how to fix it."
//!
//! Rules are immutable once built. They only reference other rules by name,
//! through [`Input::Captured`], [`Query::Captured`] and
//! [`Expectation::MatchesCaptured`].

use serde::Serialize;

use super::resources::{
    ClusterField, CredentialField, DeploymentField, IdentityField, ServiceAccountField,
    ServiceField, VaultField,
};

/// A query parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Input {
    /// A fixed value from configuration
    Literal(String),
    /// The value captured by an earlier rule
    Captured(String),
}

impl Input {
    /// Create a literal input
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Create an input that reads an earlier rule's captured value
    pub fn captured(rule: impl Into<String>) -> Self {
        Self::Captured(rule.into())
    }

    /// The rule this input depends on, if any
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Captured(rule) => Some(rule.as_str()),
        }
    }
}

impl std::fmt::Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Captured(rule) => write!(f, "<{rule}>"),
        }
    }
}

/// A read-only query against the cloud resource manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloudQuery {
    /// A field of an AKS managed cluster
    ManagedCluster {
        /// Resource group
        resource_group: Input,
        /// Cluster name
        name: Input,
        /// Field to observe
        field: ClusterField,
    },
    /// A field of a Key Vault
    KeyVault {
        /// Resource group
        resource_group: Input,
        /// Vault name
        name: Input,
        /// Field to observe
        field: VaultField,
    },
    /// The value of a Key Vault secret
    Secret {
        /// Vault name
        vault: Input,
        /// Secret name
        name: Input,
    },
    /// A field of a managed identity
    Identity {
        /// Resource group
        resource_group: Input,
        /// Identity name
        name: Input,
        /// Field to observe
        field: IdentityField,
    },
    /// A role assignment; observes the role name when assigned
    RoleAssignment {
        /// Principal id of the assignee
        assignee: Input,
        /// Scope resource id
        scope: Input,
        /// Role definition name
        role: Input,
    },
    /// A field of a federated credential
    FederatedCredential {
        /// Resource group
        resource_group: Input,
        /// Owning identity name
        identity: Input,
        /// Credential name
        name: Input,
        /// Field to observe
        field: CredentialField,
    },
}

/// A read-only query against the cluster API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterQuery {
    /// Namespace existence; observes the namespace name
    Namespace {
        /// Namespace name
        name: Input,
    },
    /// A field of a service account
    ServiceAccount {
        /// Namespace
        namespace: Input,
        /// Service account name
        name: Input,
        /// Field to observe
        field: ServiceAccountField,
    },
    /// A field of a deployment
    Deployment {
        /// Namespace
        namespace: Input,
        /// Deployment name
        name: Input,
        /// Field to observe
        field: DeploymentField,
    },
    /// The phases of the pods matching a label selector
    PodPhase {
        /// Namespace
        namespace: Input,
        /// Label selector (e.g. `app=web`)
        selector: Input,
    },
    /// A field of a service
    Service {
        /// Namespace
        namespace: Input,
        /// Service name
        name: Input,
        /// Field to observe
        field: ServiceField,
    },
}

/// An unauthenticated HTTP GET reading one field of a JSON body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpQuery {
    /// Host (and optional port) to contact
    pub address: Input,
    /// Request path, starting with `/`
    pub path: String,
    /// Top-level body field to observe
    pub field: String,
}

impl HttpQuery {
    /// The URL for a resolved address
    #[must_use]
    pub fn url(&self, address: &str) -> String {
        if address.parse::<std::net::Ipv6Addr>().is_ok() {
            format!("http://[{address}]{}", self.path)
        } else {
            format!("http://{address}{}", self.path)
        }
    }
}

/// The system a query talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum System {
    /// Cloud resource manager
    Cloud,
    /// Cluster API server
    Cluster,
    /// HTTP endpoint
    Http,
    /// No external system: reads a captured value
    Derived,
}

impl std::fmt::Display for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloud => write!(f, "cloud"),
            Self::Cluster => write!(f, "cluster"),
            Self::Http => write!(f, "http"),
            Self::Derived => write!(f, "derived"),
        }
    }
}

/// What a rule observes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Query {
    /// Cloud resource manager query
    Cloud(CloudQuery),
    /// Cluster API query
    Cluster(ClusterQuery),
    /// HTTP probe
    Http(HttpQuery),
    /// Re-read the value captured by an earlier rule
    Captured(String),
}

impl Query {
    /// The system this query talks to
    #[must_use]
    pub const fn system(&self) -> System {
        match self {
            Self::Cloud(_) => System::Cloud,
            Self::Cluster(_) => System::Cluster,
            Self::Http(_) => System::Http,
            Self::Captured(_) => System::Derived,
        }
    }

    /// All parameters of this query, in declaration order
    #[must_use]
    pub fn inputs(&self) -> Vec<&Input> {
        match self {
            Self::Cloud(query) => match query {
                CloudQuery::ManagedCluster {
                    resource_group,
                    name,
                    ..
                }
                | CloudQuery::KeyVault {
                    resource_group,
                    name,
                    ..
                }
                | CloudQuery::Identity {
                    resource_group,
                    name,
                    ..
                } => vec![resource_group, name],
                CloudQuery::Secret { vault, name } => vec![vault, name],
                CloudQuery::RoleAssignment {
                    assignee,
                    scope,
                    role,
                } => vec![assignee, scope, role],
                CloudQuery::FederatedCredential {
                    resource_group,
                    identity,
                    name,
                    ..
                } => vec![resource_group, identity, name],
            },
            Self::Cluster(query) => match query {
                ClusterQuery::Namespace { name } => vec![name],
                ClusterQuery::ServiceAccount {
                    namespace, name, ..
                }
                | ClusterQuery::Deployment {
                    namespace, name, ..
                }
                | ClusterQuery::Service {
                    namespace, name, ..
                } => vec![namespace, name],
                ClusterQuery::PodPhase {
                    namespace,
                    selector,
                } => vec![namespace, selector],
            },
            Self::Http(query) => vec![&query.address],
            Self::Captured(_) => Vec::new(),
        }
    }

    /// Names of the rules this query reads from
    #[must_use]
    pub fn references(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = self.inputs().into_iter().filter_map(Input::reference).collect();
        if let Self::Captured(rule) = self {
            refs.push(rule.as_str());
        }
        refs
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloud(CloudQuery::ManagedCluster {
                resource_group,
                name,
                field,
            }) => write!(f, "aks {resource_group}/{name} {field}"),
            Self::Cloud(CloudQuery::KeyVault {
                resource_group,
                name,
                field,
            }) => write!(f, "keyvault {resource_group}/{name} {field}"),
            Self::Cloud(CloudQuery::Secret { vault, name }) => {
                write!(f, "keyvault secret {vault}/{name} value")
            },
            Self::Cloud(CloudQuery::Identity {
                resource_group,
                name,
                field,
            }) => write!(f, "identity {resource_group}/{name} {field}"),
            Self::Cloud(CloudQuery::RoleAssignment {
                assignee,
                scope,
                role,
            }) => write!(f, "role assignment '{role}' for {assignee} on {scope}"),
            Self::Cloud(CloudQuery::FederatedCredential {
                resource_group,
                identity,
                name,
                field,
            }) => write!(f, "federated credential {resource_group}/{identity}/{name} {field}"),
            Self::Cluster(ClusterQuery::Namespace { name }) => write!(f, "namespace {name}"),
            Self::Cluster(ClusterQuery::ServiceAccount {
                namespace,
                name,
                field,
            }) => write!(f, "serviceaccount {namespace}/{name} {field}"),
            Self::Cluster(ClusterQuery::Deployment {
                namespace,
                name,
                field,
            }) => write!(f, "deployment {namespace}/{name} {field}"),
            Self::Cluster(ClusterQuery::PodPhase {
                namespace,
                selector,
            }) => write!(f, "pods {namespace} -l {selector} status.phase"),
            Self::Cluster(ClusterQuery::Service {
                namespace,
                name,
                field,
            }) => write!(f, "service {namespace}/{name} {field}"),
            Self::Http(query) => write!(f, "GET http://{}{} .{}", query.address, query.path, query.field),
            Self::Captured(rule) => write!(f, "captured <{rule}>"),
        }
    }
}

/// How an observation is judged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Expectation {
    /// Observed value equals this exact string
    Equals(String),
    /// Any non-empty value is present
    NonEmpty,
    /// Observed value equals the value captured by an earlier rule
    MatchesCaptured(String),
    /// Report the observation without judging it (non-gating)
    Observe,
}

impl Expectation {
    /// Create an exact-equality expectation
    pub fn equals(value: impl Into<String>) -> Self {
        Self::Equals(value.into())
    }

    /// Create an expectation against an earlier rule's captured value
    pub fn matches_captured(rule: impl Into<String>) -> Self {
        Self::MatchesCaptured(rule.into())
    }

    /// The rule this expectation depends on, if any
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::MatchesCaptured(rule) => Some(rule.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equals(value) => write!(f, "= {value}"),
            Self::NonEmpty => write!(f, "present"),
            Self::MatchesCaptured(rule) => write!(f, "= <{rule}>"),
            Self::Observe => write!(f, "observe"),
        }
    }
}

/// One fact to verify
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Unique name, e.g. `aks.oidc-issuer-enabled`
    pub name: String,
    /// Short human description
    pub title: String,
    /// What to observe
    pub query: Query,
    /// How to judge the observation
    pub expectation: Expectation,
    /// Hint shown on failure; `{observed}` and `{expected}` are substituted
    pub remediation: String,
}

impl Rule {
    /// Create a rule without a remediation hint
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        query: Query,
        expectation: Expectation,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            query,
            expectation,
            remediation: String::new(),
        }
    }

    /// Attach a remediation hint
    #[must_use]
    pub fn with_remediation(mut self, hint: impl Into<String>) -> Self {
        self.remediation = hint.into();
        self
    }

    /// Whether a failed expectation fails the run
    #[must_use]
    pub fn is_gating(&self) -> bool {
        self.expectation != Expectation::Observe
    }

    /// Names of all rules this rule depends on, without duplicates
    #[must_use]
    pub fn references(&self) -> Vec<&str> {
        let mut refs = self.query.references();
        refs.extend(self.expectation.reference());
        let mut seen = std::collections::HashSet::new();
        refs.retain(|r| seen.insert(*r));
        refs
    }

    /// The remediation hint with observed and expected values filled in
    ///
    /// Placeholders are substituted in one pass, so substituted values are
    /// never themselves expanded.
    #[must_use]
    pub fn remediation_for(&self, observed: Option<&str>, expected: Option<&str>) -> String {
        const OBSERVED: &str = "{observed}";
        const EXPECTED: &str = "{expected}";

        let mut out = String::with_capacity(self.remediation.len());
        let mut rest = self.remediation.as_str();
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix(OBSERVED) {
                out.push_str(observed.unwrap_or("<absent>"));
                rest = after;
            } else if let Some(after) = tail.strip_prefix(EXPECTED) {
                out.push_str(expected.unwrap_or("<absent>"));
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}
