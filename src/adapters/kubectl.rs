//! kubectl adapter
//!
//! Implements [`ClusterApi`] by running `kubectl get ... -o json`.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::command::{CommandRunner, parse_json, stdout_of};
use crate::core::error::QueryError;
use crate::core::models::resources::{Deployment, Namespace, Pod, Service, ServiceAccount};
use crate::core::ports::ClusterApi;

#[derive(Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

/// `kubectl` backed cluster API
#[derive(Debug)]
pub struct Kubectl<R> {
    runner: R,
    context: Option<String>,
}

impl<R: CommandRunner> Kubectl<R> {
    /// Create an adapter using the current kubeconfig context
    pub const fn new(runner: R) -> Self {
        Self {
            runner,
            context: None,
        }
    }

    /// Use a specific kubeconfig context
    #[must_use]
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    fn get<T: DeserializeOwned>(&self, what: &str, args: &[&str]) -> Result<T, QueryError> {
        let mut argv = Vec::with_capacity(args.len() + 5);
        if let Some(context) = &self.context {
            argv.extend(["--context".to_string(), context.clone()]);
        }
        argv.push("get".to_string());
        argv.extend(args.iter().map(|a| (*a).to_string()));
        argv.extend(["--output".to_string(), "json".to_string()]);

        let output = self.runner.run("kubectl", &argv)?;
        let stdout = stdout_of(output, what)?;
        parse_json(&stdout, what)
    }
}

impl<R: CommandRunner> ClusterApi for Kubectl<R> {
    fn namespace(&self, name: &str) -> Result<Namespace, QueryError> {
        self.get(&format!("namespace {name}"), &["namespace", name])
    }

    fn service_account(&self, namespace: &str, name: &str) -> Result<ServiceAccount, QueryError> {
        self.get(
            &format!("serviceaccount {namespace}/{name}"),
            &["serviceaccount", name, "--namespace", namespace],
        )
    }

    fn deployment(&self, namespace: &str, name: &str) -> Result<Deployment, QueryError> {
        self.get(
            &format!("deployment {namespace}/{name}"),
            &["deployment", name, "--namespace", namespace],
        )
    }

    fn pods(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>, QueryError> {
        let list: PodList = self.get(
            &format!("pods {namespace} -l {selector}"),
            &["pods", "--namespace", namespace, "--selector", selector],
        )?;
        Ok(list.items)
    }

    fn service(&self, namespace: &str, name: &str) -> Result<Service, QueryError> {
        self.get(
            &format!("service {namespace}/{name}"),
            &["service", name, "--namespace", namespace],
        )
    }
}
