//! Verification engine
//!
//! Runs a [`Checklist`] front to back against the ports. Every rule yields
//! exactly one [`RuleResult`]; a failing rule never stops the run, so a single
//! pass surfaces every misconfiguration.
//!
//! Each rule's observation is captured under its name. Later rules read
//! captured values by reference and never re-query the external system.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::error::QueryError;
use crate::core::models::resources::pod_phases;
use crate::core::models::{
    Checklist, CloudQuery, ClusterQuery, Expectation, HttpQuery, Input, Query, Rule, RuleResult,
    RunSummary, Status,
};
use crate::core::ports::{CloudApi, ClusterApi, HttpProbe};

/// How query failures other than "not found" are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryErrorPolicy {
    /// Report an `Error` result, distinct from a failed expectation
    #[default]
    Distinct,
    /// Treat the failure as an absent observation
    Absent,
}

impl std::fmt::Display for QueryErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Distinct => write!(f, "distinct"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

impl std::str::FromStr for QueryErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "distinct" => Ok(Self::Distinct),
            "absent" => Ok(Self::Absent),
            _ => Err(format!("Invalid query error policy: {s}. Use: distinct, absent")),
        }
    }
}

/// Values captured so far in a run, keyed by rule name
#[derive(Debug, Default)]
struct Captures {
    values: HashMap<String, Option<String>>,
}

impl Captures {
    fn value(&self, rule: &str) -> Option<&str> {
        self.values.get(rule).and_then(Option::as_deref)
    }

    fn record(&mut self, rule: &str, value: Option<String>) {
        self.values.insert(rule.to_string(), value);
    }
}

/// Why a rule produced no observation
#[derive(Debug)]
enum Unobserved {
    /// A query input refers to a rule that captured nothing
    MissingInput(String),
    /// The external query failed
    Query(QueryError),
}

impl From<QueryError> for Unobserved {
    fn from(err: QueryError) -> Self {
        Self::Query(err)
    }
}

const fn verdict(holds: bool) -> Status {
    if holds { Status::Pass } else { Status::Fail }
}

/// Executes checklists against a set of ports
#[derive(Clone, Copy)]
pub struct Engine<'a> {
    cloud: &'a dyn CloudApi,
    cluster: &'a dyn ClusterApi,
    probe: &'a dyn HttpProbe,
    policy: QueryErrorPolicy,
}

impl std::fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("policy", &self.policy).finish_non_exhaustive()
    }
}

impl<'a> Engine<'a> {
    /// Create an engine with the default query error policy
    #[must_use]
    pub fn new(
        cloud: &'a dyn CloudApi,
        cluster: &'a dyn ClusterApi,
        probe: &'a dyn HttpProbe,
    ) -> Self {
        Self {
            cloud,
            cluster,
            probe,
            policy: QueryErrorPolicy::default(),
        }
    }

    /// Set the query error policy
    #[must_use]
    pub const fn with_policy(mut self, policy: QueryErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run every rule in order and summarize
    #[must_use]
    pub fn run(&self, checklist: &Checklist) -> RunSummary {
        let mut captured = Captures::default();
        let mut results = Vec::with_capacity(checklist.len());

        for rule in checklist {
            log::debug!("{}: {}", rule.name, rule.query);
            let result = self.evaluate(rule, &captured);
            log::debug!("{}: {}", rule.name, result.status);

            captured.record(&rule.name, result.observed.clone());
            results.push(result);
        }

        RunSummary::from_results(results)
    }

    fn evaluate(&self, rule: &Rule, captured: &Captures) -> RuleResult {
        match self.observe(&rule.query, captured) {
            Ok(observed) => judge(rule, observed, None, captured),
            Err(Unobserved::MissingInput(input)) => {
                let detail = format!("skipped: input `{input}` captured no value");
                finish(
                    rule,
                    unobserved_status(rule, Status::Fail),
                    None,
                    expected_display(rule, captured),
                    Some(detail),
                )
            },
            Err(Unobserved::Query(err)) if err.is_not_found() => {
                judge(rule, None, Some(err.to_string()), captured)
            },
            Err(Unobserved::Query(err)) => {
                log::warn!("{}: {err}", rule.name);
                match self.policy {
                    QueryErrorPolicy::Absent => judge(rule, None, Some(err.to_string()), captured),
                    QueryErrorPolicy::Distinct => finish(
                        rule,
                        unobserved_status(rule, Status::Error),
                        None,
                        expected_display(rule, captured),
                        Some(err.to_string()),
                    ),
                }
            },
        }
    }

    fn observe(&self, query: &Query, captured: &Captures) -> Result<Option<String>, Unobserved> {
        let observed = match query {
            Query::Cloud(q) => self.observe_cloud(q, captured)?,
            Query::Cluster(q) => self.observe_cluster(q, captured)?,
            Query::Http(q) => self.observe_http(q, captured)?,
            Query::Captured(rule) => captured.value(rule).map(String::from),
        };
        Ok(observed.filter(|v| !v.is_empty()))
    }

    fn observe_cloud(
        &self,
        query: &CloudQuery,
        captured: &Captures,
    ) -> Result<Option<String>, Unobserved> {
        let get = |input: &Input| resolve(input, captured);
        match query {
            CloudQuery::ManagedCluster {
                resource_group,
                name,
                field,
            } => {
                let cluster = self.cloud.managed_cluster(&get(resource_group)?, &get(name)?)?;
                Ok(field.extract(&cluster))
            },
            CloudQuery::KeyVault {
                resource_group,
                name,
                field,
            } => {
                let vault = self.cloud.key_vault(&get(resource_group)?, &get(name)?)?;
                Ok(field.extract(&vault))
            },
            CloudQuery::Secret { vault, name } => {
                let secret = self.cloud.secret(&get(vault)?, &get(name)?)?;
                Ok(secret.value)
            },
            CloudQuery::Identity {
                resource_group,
                name,
                field,
            } => {
                let identity = self.cloud.managed_identity(&get(resource_group)?, &get(name)?)?;
                Ok(field.extract(&identity))
            },
            CloudQuery::RoleAssignment {
                assignee,
                scope,
                role,
            } => {
                let role = get(role)?;
                let assignments = self.cloud.role_assignments(&get(assignee)?, &get(scope)?)?;
                Ok(assignments
                    .into_iter()
                    .find(|a| a.role_definition_name == role)
                    .map(|a| a.role_definition_name))
            },
            CloudQuery::FederatedCredential {
                resource_group,
                identity,
                name,
                field,
            } => {
                let credential = self.cloud.federated_credential(
                    &get(resource_group)?,
                    &get(identity)?,
                    &get(name)?,
                )?;
                Ok(field.extract(&credential))
            },
        }
    }

    fn observe_cluster(
        &self,
        query: &ClusterQuery,
        captured: &Captures,
    ) -> Result<Option<String>, Unobserved> {
        let get = |input: &Input| resolve(input, captured);
        match query {
            ClusterQuery::Namespace { name } => {
                let namespace = self.cluster.namespace(&get(name)?)?;
                Ok(Some(namespace.metadata.name))
            },
            ClusterQuery::ServiceAccount {
                namespace,
                name,
                field,
            } => {
                let account = self.cluster.service_account(&get(namespace)?, &get(name)?)?;
                Ok(field.extract(&account))
            },
            ClusterQuery::Deployment {
                namespace,
                name,
                field,
            } => {
                let deployment = self.cluster.deployment(&get(namespace)?, &get(name)?)?;
                Ok(field.extract(&deployment))
            },
            ClusterQuery::PodPhase {
                namespace,
                selector,
            } => {
                let pods = self.cluster.pods(&get(namespace)?, &get(selector)?)?;
                Ok(pod_phases(&pods))
            },
            ClusterQuery::Service {
                namespace,
                name,
                field,
            } => {
                let service = self.cluster.service(&get(namespace)?, &get(name)?)?;
                Ok(field.extract(&service))
            },
        }
    }

    fn observe_http(
        &self,
        query: &HttpQuery,
        captured: &Captures,
    ) -> Result<Option<String>, Unobserved> {
        let url = query.url(&resolve(&query.address, captured)?);
        let body = self.probe.get_json(&url)?;
        match body.get(&query.field) {
            None => Err(QueryError::Malformed(format!(
                "{url} returned no `{}` field",
                query.field
            ))
            .into()),
            Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Ok(Some(other.to_string())),
        }
    }
}

fn resolve(input: &Input, captured: &Captures) -> Result<String, Unobserved> {
    match input {
        Input::Literal(value) => Ok(value.clone()),
        Input::Captured(rule) => captured
            .value(rule)
            .map(String::from)
            .ok_or_else(|| Unobserved::MissingInput(rule.clone())),
    }
}

/// Informational rules report `Info` even when nothing could be observed
fn unobserved_status(rule: &Rule, status: Status) -> Status {
    if rule.is_gating() { status } else { Status::Info }
}

fn expected_display(rule: &Rule, captured: &Captures) -> Option<String> {
    match &rule.expectation {
        Expectation::Equals(value) => Some(value.clone()),
        Expectation::MatchesCaptured(other) => captured.value(other).map(String::from),
        Expectation::NonEmpty | Expectation::Observe => None,
    }
}

fn judge(
    rule: &Rule,
    observed: Option<String>,
    detail: Option<String>,
    captured: &Captures,
) -> RuleResult {
    let expected = expected_display(rule, captured);
    let (status, detail) = match &rule.expectation {
        Expectation::Observe => (Status::Info, detail),
        Expectation::NonEmpty => (verdict(observed.is_some()), detail),
        Expectation::Equals(value) => (verdict(observed.as_deref() == Some(value.as_str())), detail),
        Expectation::MatchesCaptured(other) => match captured.value(other) {
            Some(value) => (verdict(observed.as_deref() == Some(value)), detail),
            None => (
                Status::Fail,
                Some(detail.unwrap_or_else(|| format!("`{other}` captured no value to compare"))),
            ),
        },
    };
    finish(rule, status, observed, expected, detail)
}

fn finish(
    rule: &Rule,
    status: Status,
    observed: Option<String>,
    expected: Option<String>,
    detail: Option<String>,
) -> RuleResult {
    let remediation = (status.is_gating_failure() && !rule.remediation.is_empty())
        .then(|| rule.remediation_for(observed.as_deref(), expected.as_deref()));

    RuleResult {
        rule: rule.name.clone(),
        title: rule.title.clone(),
        status,
        observed,
        expected,
        detail,
        remediation,
    }
}
