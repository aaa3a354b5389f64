// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// FastFed Configuration Manifest - YAML source for FastFedConfiguration
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) covering:
// - Which installed profiles this deployment enables
// - Preferred schema grammar for desired attributes
// - SCIM provisioning limits
// - Signing-algorithm negotiation policy
// - Contract proposal lifetime

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::config::{
    FastFedConfiguration, SchemaGrammar, SigningAlgorithmPolicy,
    DEFAULT_GROUP_MEMBERSHIP_CHANGES, KNOWN_SIGNING_ALGORITHMS, MAX_CONTRACT_PROPOSAL_TTL_DAYS,
    MAX_GROUP_MEMBERSHIP_CHANGES, MIN_GROUP_MEMBERSHIP_CHANGES,
};
use crate::domain::registry::ProfileRegistry;

const API_VERSION: &str = "fastfed/v1";
const KIND: &str = "FastFedConfig";

/// Top-level Kubernetes-style FastFed configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastFedConfigManifest {
    /// API version (must be "fastfed/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "FastFedConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: FastFedConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FastFedConfigSpec {
    /// Profile URNs to enable. Empty enables every installed profile.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<String>,

    #[serde(default)]
    pub preferred_schema_grammar: SchemaGrammar,

    #[serde(default)]
    pub scim: ScimConfig,

    #[serde(default)]
    pub signing: SigningConfig,

    #[serde(default)]
    pub proposal: ProposalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScimConfig {
    #[serde(default)]
    pub can_support_nested_groups: bool,

    /// Allowed range: 100..=1000
    #[serde(default = "default_max_group_membership_changes")]
    pub max_group_membership_changes: u32,
}

impl Default for ScimConfig {
    fn default() -> Self {
        Self {
            can_support_nested_groups: false,
            max_group_membership_changes: default_max_group_membership_changes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigningConfig {
    /// "intersection" (default) or "most-preferred"
    #[serde(default)]
    pub policy: SigningAlgorithmPolicy,

    /// Replaces the built-in disallowed list (none, HS256, HS384, HS512) when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disallowed_algorithms: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalConfig {
    /// How long a contract proposal stays open, e.g. "24h" or "30m"
    #[serde(with = "humantime_serde", default = "default_proposal_ttl")]
    pub ttl: Duration,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            ttl: default_proposal_ttl(),
        }
    }
}

fn default_max_group_membership_changes() -> u32 {
    DEFAULT_GROUP_MEMBERSHIP_CHANGES
}

fn default_proposal_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

impl Default for FastFedConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "fastfed".to_string(),
                version: None,
                labels: None,
            },
            spec: FastFedConfigSpec::default(),
        }
    }
}

impl FastFedConfigManifest {
    /// Parse a manifest file. The path is attached to read and parse failures.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read FastFed manifest {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Cannot parse FastFed manifest {}", path.display()))
    }

    /// Write the manifest as YAML, e.g. to seed a deployment's config file.
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Cannot write FastFed manifest {}", path.display()))
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// First existing manifest among `FASTFED_CONFIG_PATH`, `./fastfed-config.yaml`,
    /// `~/.fastfed/config.yaml` and the system-wide location.
    pub fn discover_config() -> Option<PathBuf> {
        let explicit = std::env::var_os("FASTFED_CONFIG_PATH").map(PathBuf::from);
        let working_dir = Some(PathBuf::from("./fastfed-config.yaml"));
        let user = dirs::home_dir().map(|home| home.join(".fastfed").join("config.yaml"));

        #[cfg(unix)]
        let system = Some(PathBuf::from("/etc/fastfed/config.yaml"));
        #[cfg(windows)]
        let system = Some(PathBuf::from("C:\\ProgramData\\FastFed\\config.yaml"));
        #[cfg(not(any(unix, windows)))]
        let system: Option<PathBuf> = None;

        [explicit, working_dir, user, system]
            .into_iter()
            .flatten()
            .find(|candidate| candidate.is_file())
    }

    /// Load `explicit_path`, else the discovered manifest, else defaults; then
    /// apply environment overrides. An explicit path must exist and parse.
    pub fn load_or_default(explicit_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut manifest = match explicit_path.or_else(Self::discover_config) {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading FastFed manifest");
                Self::from_yaml_file(&path)?
            }
            None => {
                tracing::warn!("No FastFed manifest found, using defaults");
                Self::default()
            }
        };
        manifest.apply_env_overrides();
        Ok(manifest)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("FASTFED_SCIM_NESTED_GROUPS") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => {
                    tracing::info!("Environment override: FASTFED_SCIM_NESTED_GROUPS=true");
                    self.spec.scim.can_support_nested_groups = true;
                }
                "false" | "0" | "no" | "off" => {
                    tracing::info!("Environment override: FASTFED_SCIM_NESTED_GROUPS=false");
                    self.spec.scim.can_support_nested_groups = false;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for FASTFED_SCIM_NESTED_GROUPS: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Some(val) = lookup("FASTFED_SCIM_MAX_GROUP_MEMBERSHIP_CHANGES") {
            match val.trim().parse::<u32>() {
                Ok(max) => {
                    tracing::info!(
                        "Environment override: FASTFED_SCIM_MAX_GROUP_MEMBERSHIP_CHANGES={}",
                        max
                    );
                    self.spec.scim.max_group_membership_changes = max;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for FASTFED_SCIM_MAX_GROUP_MEMBERSHIP_CHANGES: '{}'. Expected an integer. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let max = self.spec.scim.max_group_membership_changes;
        if !(MIN_GROUP_MEMBERSHIP_CHANGES..=MAX_GROUP_MEMBERSHIP_CHANGES).contains(&max) {
            anyhow::bail!(
                "spec.scim.max_group_membership_changes must be between {} and {}, got {}",
                MIN_GROUP_MEMBERSHIP_CHANGES,
                MAX_GROUP_MEMBERSHIP_CHANGES,
                max
            );
        }

        if self.spec.proposal.ttl.is_zero() {
            anyhow::bail!("spec.proposal.ttl must be greater than zero");
        }
        let max_ttl = Duration::from_secs(MAX_CONTRACT_PROPOSAL_TTL_DAYS as u64 * 24 * 60 * 60);
        if self.spec.proposal.ttl > max_ttl {
            anyhow::bail!(
                "spec.proposal.ttl must not exceed {} days",
                MAX_CONTRACT_PROPOSAL_TTL_DAYS
            );
        }

        for algorithm in self.spec.signing.disallowed_algorithms.iter().flatten() {
            if !KNOWN_SIGNING_ALGORITHMS.contains(&algorithm.as_str()) {
                anyhow::bail!("Unknown signing algorithm in spec.signing.disallowed_algorithms: '{}'", algorithm);
            }
        }

        Ok(())
    }

    /// Build the immutable configuration over the built-in profiles
    pub fn to_configuration(&self) -> anyhow::Result<Arc<FastFedConfiguration>> {
        self.to_configuration_with_registry(&ProfileRegistry::known())
    }

    /// Build the immutable configuration, enabling `spec.profiles` out of `registry`
    pub fn to_configuration_with_registry(
        &self,
        registry: &ProfileRegistry,
    ) -> anyhow::Result<Arc<FastFedConfiguration>> {
        self.validate()?;

        let registry = if self.spec.profiles.is_empty() {
            registry.clone()
        } else {
            let mut enabled = ProfileRegistry::new();
            for urn in &self.spec.profiles {
                let profile = registry
                    .resolve(urn)
                    .with_context(|| format!("Profile '{}' in spec.profiles is not installed", urn))?;
                enabled.register(profile);
            }
            enabled
        };

        let ttl = chrono::Duration::from_std(self.spec.proposal.ttl)
            .context("spec.proposal.ttl is out of range")?;

        let mut builder = FastFedConfiguration::builder()
            .registry(registry)
            .preferred_schema_grammar(self.spec.preferred_schema_grammar)
            .scim_can_support_nested_groups(self.spec.scim.can_support_nested_groups)
            .scim_max_group_membership_changes(self.spec.scim.max_group_membership_changes)
            .signing_algorithm_policy(self.spec.signing.policy)
            .contract_proposal_ttl(ttl);
        if let Some(disallowed) = &self.spec.signing.disallowed_algorithms {
            builder = builder.disallowed_signing_algorithms(disallowed.iter().cloned());
        }

        let config = builder
            .build()
            .context("Invalid FastFed configuration")?;
        tracing::info!(
            name = %self.metadata.name,
            profiles = config.registry().len(),
            "FastFed configuration loaded"
        );
        Ok(config)
    }
}
