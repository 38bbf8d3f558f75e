//! Configuration management
//!
//! Names the resources under verification and tunes the engine. Config is
//! looked up in order:
//!
//! 1. an explicit `--config` path
//! 2. `./wiverify.toml`
//! 3. `~/.config/wiverify/config.toml` (XDG standard)
//! 4. built-in defaults
//!
//! `WIVERIFY_*` environment variables override identifiers afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::services::{Identifiers, QueryErrorPolicy};

/// File name looked up in the current directory
pub const LOCAL_CONFIG: &str = "wiverify.toml";

/// Full configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Names of the resources to verify
    #[serde(default)]
    pub identifiers: Identifiers,
    /// Engine behavior
    #[serde(default)]
    pub engine: EngineConfig,
    /// Cloud API settings
    #[serde(default)]
    pub cloud: CloudConfig,
    /// Cluster API settings
    #[serde(default)]
    pub cluster: ClusterConfig,
}

/// Engine behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-query timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How query failures other than "not found" are reported
    #[serde(default)]
    pub query_errors: QueryErrorPolicy,
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            query_errors: QueryErrorPolicy::default(),
        }
    }
}

/// Cloud API settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Subscription to query instead of the CLI default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

/// Cluster API settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// kubeconfig context to use instead of the current one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Config {
    /// Path of the per-user config file
    #[must_use]
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("wiverify").join("config.toml"))
    }

    /// Parse a config document
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.engine.timeout_secs > 0, "engine.timeout_secs must be at least 1");
        Ok(())
    }

    /// Read a config file
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Find and load the effective config
    ///
    /// Returns the config and the file it came from, if any. Environment
    /// overrides are applied.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let source = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => std::iter::once(PathBuf::from(LOCAL_CONFIG))
                .chain(Self::global_path())
                .find(|p| p.is_file()),
        };

        let mut config = match &source {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate().context("Invalid config from environment")?;

        if let Some(path) = &source {
            log::debug!("config: {}", path.display());
        }
        Ok((config, source))
    }

    /// Override fields from `WIVERIFY_*` variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let ids = &mut self.identifiers;
        let fields: [(&str, &mut String); 13] = [
            ("WIVERIFY_RESOURCE_GROUP", &mut ids.resource_group),
            ("WIVERIFY_CLUSTER", &mut ids.cluster),
            ("WIVERIFY_VAULT", &mut ids.vault),
            ("WIVERIFY_SECRET", &mut ids.secret),
            ("WIVERIFY_IDENTITY", &mut ids.identity),
            ("WIVERIFY_FEDERATED_CREDENTIAL", &mut ids.federated_credential),
            ("WIVERIFY_NAMESPACE", &mut ids.namespace),
            ("WIVERIFY_SERVICE_ACCOUNT", &mut ids.service_account),
            ("WIVERIFY_DEPLOYMENT", &mut ids.deployment),
            ("WIVERIFY_SERVICE", &mut ids.service),
            ("WIVERIFY_POD_SELECTOR", &mut ids.pod_selector),
            ("WIVERIFY_PROBE_PATH", &mut ids.probe_path),
            ("WIVERIFY_PROBE_FIELD", &mut ids.probe_field),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *field = value;
            }
        }

        if let Some(value) = lookup("WIVERIFY_SUBSCRIPTION").filter(|v| !v.is_empty()) {
            self.cloud.subscription = Some(value);
        }
        if let Some(value) = lookup("WIVERIFY_CONTEXT").filter(|v| !v.is_empty()) {
            self.cluster.context = Some(value);
        }
        if let Some(secs) = lookup("WIVERIFY_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.engine.timeout_secs = secs;
        }
    }

    /// Per-query timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.engine.timeout_secs)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
