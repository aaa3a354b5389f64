// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # FastFed Configuration
//!
//! Process-wide, immutable settings threaded into every metadata constructor:
//!
//! - the [`ProfileRegistry`] consulted for extension resolution
//! - the preferred [`SchemaGrammar`] for desired-attribute documents
//! - SCIM limits (nested groups, max group-membership changes per request)
//! - the [`SigningAlgorithmPolicy`] and disallowed algorithms used by negotiation
//! - the default contract-proposal lifetime
//!
//! Built once through [`FastFedConfigurationBuilder`] and shared as
//! `Arc<FastFedConfiguration>`. Out-of-range values are rejected by
//! [`FastFedConfigurationBuilder::build`], never later at negotiation time.
//! Customizing the registry copies it; a configuration handed to a negotiation
//! is never mutated in place.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::profile::Profile;
use crate::domain::registry::ProfileRegistry;

/// Smallest accepted `max_group_membership_changes`.
pub const MIN_GROUP_MEMBERSHIP_CHANGES: u32 = 100;
/// Largest accepted `max_group_membership_changes`.
pub const MAX_GROUP_MEMBERSHIP_CHANGES: u32 = 1000;
/// Applied when no explicit value is configured.
pub const DEFAULT_GROUP_MEMBERSHIP_CHANGES: u32 = 100;

/// Longest accepted contract-proposal lifetime, in days.
pub const MAX_CONTRACT_PROPOSAL_TTL_DAYS: i64 = 3650;

/// JWS algorithm names accepted in `signing_algorithms`.
pub const KNOWN_SIGNING_ALGORITHMS: &[&str] = &[
    "RS256", "RS384", "RS512", "PS256", "PS384", "PS512", "ES256", "ES384", "ES512", "EdDSA",
    "HS256", "HS384", "HS512", "none",
];

/// Algorithms that may never be agreed: unsigned, or symmetric and therefore
/// unverifiable through a published JWKS.
pub const DEFAULT_DISALLOWED_SIGNING_ALGORITHMS: &[&str] = &["none", "HS256", "HS384", "HS512"];

/// Schema grammar used to express desired attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SchemaGrammar {
    #[default]
    #[serde(rename = "urn:ietf:params:fastfed:1.0:schemas:scim:2.0")]
    Scim2,
}

impl SchemaGrammar {
    pub const ALL: [SchemaGrammar; 1] = [SchemaGrammar::Scim2];

    pub fn urn(&self) -> &'static str {
        match self {
            Self::Scim2 => "urn:ietf:params:fastfed:1.0:schemas:scim:2.0",
        }
    }

    pub fn from_urn(urn: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|grammar| grammar.urn() == urn)
    }
}

impl fmt::Display for SchemaGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.urn())
    }
}

/// How the shared signing-algorithm list of a contract is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SigningAlgorithmPolicy {
    /// Every algorithm both sides advertise, in the identity provider's order.
    #[default]
    Intersection,
    /// Only the identity provider's most preferred algorithm the application
    /// provider also advertises.
    MostPreferred,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "max_group_membership_changes must be between {min} and {max}, got {value}"
    )]
    GroupMembershipChangesOutOfRange { value: u32, min: u32, max: u32 },

    #[error("contract proposal TTL must be positive, got {0} seconds")]
    InvalidProposalTtl(i64),

    #[error("contract proposal TTL must not exceed {max_days} days, got {seconds} seconds")]
    ProposalTtlTooLong { seconds: i64, max_days: i64 },

    #[error("Unknown signing algorithm: '{0}'")]
    UnknownSigningAlgorithm(String),
}

/// SCIM provisioning limits advertised by this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScimSettings {
    pub can_support_nested_groups: bool,
    pub max_group_membership_changes: u32,
}

impl Default for ScimSettings {
    fn default() -> Self {
        Self {
            can_support_nested_groups: false,
            max_group_membership_changes: DEFAULT_GROUP_MEMBERSHIP_CHANGES,
        }
    }
}

/// Immutable process-wide configuration.
#[derive(Debug, Clone)]
pub struct FastFedConfiguration {
    registry: Arc<ProfileRegistry>,
    preferred_schema_grammar: SchemaGrammar,
    scim: ScimSettings,
    signing_algorithm_policy: SigningAlgorithmPolicy,
    disallowed_signing_algorithms: BTreeSet<String>,
    contract_proposal_ttl: Duration,
}

impl FastFedConfiguration {
    pub fn builder() -> FastFedConfigurationBuilder {
        FastFedConfigurationBuilder::default()
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    pub fn preferred_schema_grammar(&self) -> SchemaGrammar {
        self.preferred_schema_grammar
    }

    pub fn scim(&self) -> ScimSettings {
        self.scim
    }

    pub fn signing_algorithm_policy(&self) -> SigningAlgorithmPolicy {
        self.signing_algorithm_policy
    }

    pub fn is_signing_algorithm_disallowed(&self, algorithm: &str) -> bool {
        self.disallowed_signing_algorithms.contains(algorithm)
    }

    pub fn disallowed_signing_algorithms(&self) -> impl Iterator<Item = &str> {
        self.disallowed_signing_algorithms.iter().map(String::as_str)
    }

    pub fn contract_proposal_ttl(&self) -> Duration {
        self.contract_proposal_ttl
    }
}

/// Builder for [`FastFedConfiguration`]; validates everything in [`Self::build`].
#[derive(Debug, Clone)]
pub struct FastFedConfigurationBuilder {
    registry: ProfileRegistry,
    preferred_schema_grammar: SchemaGrammar,
    scim: ScimSettings,
    signing_algorithm_policy: SigningAlgorithmPolicy,
    disallowed_signing_algorithms: BTreeSet<String>,
    contract_proposal_ttl: Duration,
}

impl Default for FastFedConfigurationBuilder {
    fn default() -> Self {
        Self {
            registry: ProfileRegistry::known(),
            preferred_schema_grammar: SchemaGrammar::default(),
            scim: ScimSettings::default(),
            signing_algorithm_policy: SigningAlgorithmPolicy::default(),
            disallowed_signing_algorithms: DEFAULT_DISALLOWED_SIGNING_ALGORITHMS
                .iter()
                .map(|alg| alg.to_string())
                .collect(),
            contract_proposal_ttl: Duration::hours(24),
        }
    }
}

impl FastFedConfigurationBuilder {
    /// Replace the whole registry.
    pub fn registry(mut self, registry: ProfileRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Install a custom profile on top of the current registry.
    pub fn with_profile(mut self, profile: Arc<dyn Profile>) -> Self {
        self.registry = self.registry.with_profile(profile);
        self
    }

    pub fn preferred_schema_grammar(mut self, grammar: SchemaGrammar) -> Self {
        self.preferred_schema_grammar = grammar;
        self
    }

    pub fn scim_can_support_nested_groups(mut self, supported: bool) -> Self {
        self.scim.can_support_nested_groups = supported;
        self
    }

    pub fn scim_max_group_membership_changes(mut self, max: u32) -> Self {
        self.scim.max_group_membership_changes = max;
        self
    }

    pub fn signing_algorithm_policy(mut self, policy: SigningAlgorithmPolicy) -> Self {
        self.signing_algorithm_policy = policy;
        self
    }

    /// Replace the disallowed signing-algorithm set.
    pub fn disallowed_signing_algorithms<I, S>(mut self, algorithms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disallowed_signing_algorithms = algorithms.into_iter().map(Into::into).collect();
        self
    }

    pub fn contract_proposal_ttl(mut self, ttl: Duration) -> Self {
        self.contract_proposal_ttl = ttl;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<Arc<FastFedConfiguration>, ConfigError> {
        let max = self.scim.max_group_membership_changes;
        if !(MIN_GROUP_MEMBERSHIP_CHANGES..=MAX_GROUP_MEMBERSHIP_CHANGES).contains(&max) {
            return Err(ConfigError::GroupMembershipChangesOutOfRange {
                value: max,
                min: MIN_GROUP_MEMBERSHIP_CHANGES,
                max: MAX_GROUP_MEMBERSHIP_CHANGES,
            });
        }

        if self.contract_proposal_ttl <= Duration::zero() {
            return Err(ConfigError::InvalidProposalTtl(
                self.contract_proposal_ttl.num_seconds(),
            ));
        }
        if self.contract_proposal_ttl > Duration::days(MAX_CONTRACT_PROPOSAL_TTL_DAYS) {
            return Err(ConfigError::ProposalTtlTooLong {
                seconds: self.contract_proposal_ttl.num_seconds(),
                max_days: MAX_CONTRACT_PROPOSAL_TTL_DAYS,
            });
        }

        if let Some(unknown) = self
            .disallowed_signing_algorithms
            .iter()
            .find(|alg| !KNOWN_SIGNING_ALGORITHMS.contains(&alg.as_str()))
        {
            return Err(ConfigError::UnknownSigningAlgorithm(unknown.clone()));
        }

        Ok(Arc::new(self.assemble()))
    }

    fn assemble(self) -> FastFedConfiguration {
        FastFedConfiguration {
            registry: Arc::new(self.registry),
            preferred_schema_grammar: self.preferred_schema_grammar,
            scim: self.scim,
            signing_algorithm_policy: self.signing_algorithm_policy,
            disallowed_signing_algorithms: self.disallowed_signing_algorithms,
            contract_proposal_ttl: self.contract_proposal_ttl,
        }
    }
}
