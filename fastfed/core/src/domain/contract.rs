// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Contract
//!
//! The agreed description of one federation relationship: both providers, the
//! shared signing algorithms and the [`EnabledProfiles`].
//!
//! A contract references the provider objects it was negotiated from
//! (`Arc<IdentityProvider>`, `Arc<ApplicationProvider>`) rather than copies of
//! their raw trees. Its `validate` enforces that every enabled profile is
//! recognized, listed under the right type, enabled only once and present in
//! both providers' metadata-point extension maps.

use serde_json::Value;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::domain::config::FastFedConfiguration;
use crate::domain::errors::{ErrorAccumulator, FieldRule, Result};
use crate::domain::keys;
use crate::domain::metadata::{require, Metadata};
use crate::domain::profile::ProfileType;
use crate::domain::provider::{ApplicationProvider, IdentityProvider, ProviderSide};
use crate::domain::tree::{
    as_tree, hash_tree, put_string_list, put_tree, read_string_list, read_tree, JsonTree,
};

/// Profiles both parties agreed to activate, partitioned by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EnabledProfiles {
    pub authentication_profiles: BTreeSet<String>,
    pub provisioning_profiles: BTreeSet<String>,
}

impl EnabledProfiles {
    pub fn contains(&self, urn: &str) -> bool {
        self.authentication_profiles.contains(urn) || self.provisioning_profiles.contains(urn)
    }

    pub fn is_empty(&self) -> bool {
        self.authentication_profiles.is_empty() && self.provisioning_profiles.is_empty()
    }

    /// All enabled URNs, authentication first.
    pub fn urns(&self) -> impl Iterator<Item = &str> {
        self.authentication_profiles
            .iter()
            .chain(self.provisioning_profiles.iter())
            .map(String::as_str)
    }

    pub fn insert(&mut self, urn: impl Into<String>, profile_type: ProfileType) {
        match profile_type {
            ProfileType::Authentication => self.authentication_profiles.insert(urn.into()),
            ProfileType::Provisioning => self.provisioning_profiles.insert(urn.into()),
        };
    }

    fn validate_against(&self, contract: &Contract, errors: &mut ErrorAccumulator) {
        let registry = contract.config.registry();
        let sets = [
            (
                keys::AUTHENTICATION_PROFILES,
                ProfileType::Authentication,
                &self.authentication_profiles,
            ),
            (
                keys::PROVISIONING_PROFILES,
                ProfileType::Provisioning,
                &self.provisioning_profiles,
            ),
        ];

        for (key, expected, urns) in sets {
            for urn in urns {
                match registry.profile_type(urn) {
                    None => {
                        errors.add(key, FieldRule::UnrecognizedProfile(urn.clone()));
                        continue;
                    }
                    Some(actual) if actual != expected => errors.add(
                        key,
                        FieldRule::ProfileTypeMismatch {
                            urn: urn.clone(),
                            expected,
                        },
                    ),
                    Some(_) => {}
                }

                if expected == ProfileType::Provisioning
                    && self.authentication_profiles.contains(urn)
                {
                    errors.add(key, FieldRule::Conflicting(urn.clone()));
                }

                let missing_from_idp = contract
                    .identity_provider
                    .as_ref()
                    .is_some_and(|idp| !idp.metadata_extensions().contains(urn));
                if missing_from_idp {
                    errors.add(
                        key,
                        FieldRule::NotMutuallySupported {
                            urn: urn.clone(),
                            side: ProviderSide::IdentityProvider,
                        },
                    );
                }
                let missing_from_app = contract
                    .application_provider
                    .as_ref()
                    .is_some_and(|app| !app.metadata_extensions().contains(urn));
                if missing_from_app {
                    errors.add(
                        key,
                        FieldRule::NotMutuallySupported {
                            urn: urn.clone(),
                            side: ProviderSide::ApplicationProvider,
                        },
                    );
                }
            }
        }
    }

    fn hydrate_from(&mut self, tree: &JsonTree) {
        if let Some(urns) = read_string_list(tree, keys::AUTHENTICATION_PROFILES) {
            self.authentication_profiles = urns.into_iter().collect();
        }
        if let Some(urns) = read_string_list(tree, keys::PROVISIONING_PROFILES) {
            self.provisioning_profiles = urns.into_iter().collect();
        }
    }

    fn to_tree(&self) -> JsonTree {
        let as_list = |urns: &BTreeSet<String>| Some(urns.iter().cloned().collect::<Vec<_>>());
        let mut tree = JsonTree::new();
        put_string_list(
            &mut tree,
            keys::AUTHENTICATION_PROFILES,
            &as_list(&self.authentication_profiles),
        );
        put_string_list(
            &mut tree,
            keys::PROVISIONING_PROFILES,
            &as_list(&self.provisioning_profiles),
        );
        tree
    }
}

#[derive(Debug, Clone)]
pub struct Contract {
    config: Arc<FastFedConfiguration>,
    pub identity_provider: Option<Arc<IdentityProvider>>,
    pub application_provider: Option<Arc<ApplicationProvider>>,
    pub signing_algorithms: Option<Vec<String>>,
    pub enabled_profiles: EnabledProfiles,
}

impl Contract {
    /// An empty contract, ready to be hydrated.
    pub fn new(config: Arc<FastFedConfiguration>) -> Self {
        Self {
            config,
            identity_provider: None,
            application_provider: None,
            signing_algorithms: None,
            enabled_profiles: EnabledProfiles::default(),
        }
    }

    /// A contract over two already negotiated providers.
    pub fn between(
        config: Arc<FastFedConfiguration>,
        identity_provider: Arc<IdentityProvider>,
        application_provider: Arc<ApplicationProvider>,
        signing_algorithms: Vec<String>,
        enabled_profiles: EnabledProfiles,
    ) -> Self {
        Self {
            config,
            identity_provider: Some(identity_provider),
            application_provider: Some(application_provider),
            signing_algorithms: Some(signing_algorithms),
            enabled_profiles,
        }
    }

    pub fn config(&self) -> &Arc<FastFedConfiguration> {
        &self.config
    }

    pub fn identity_provider_entity_id(&self) -> Option<&str> {
        self.identity_provider
            .as_ref()
            .and_then(|idp| idp.provider.entity_id.as_deref())
    }

    pub fn application_provider_entity_id(&self) -> Option<&str> {
        self.application_provider
            .as_ref()
            .and_then(|app| app.provider.entity_id.as_deref())
    }
}

impl Metadata for Contract {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        if let Some(sub_tree) = tree.get(keys::IDENTITY_PROVIDER).filter(|v| v.is_object()) {
            let config = self.config.clone();
            let idp = self
                .identity_provider
                .get_or_insert_with(|| Arc::new(IdentityProvider::new(config)));
            Arc::make_mut(idp).hydrate(sub_tree)?;
        }
        if let Some(sub_tree) = tree.get(keys::APPLICATION_PROVIDER).filter(|v| v.is_object()) {
            let config = self.config.clone();
            let app = self
                .application_provider
                .get_or_insert_with(|| Arc::new(ApplicationProvider::new(config)));
            Arc::make_mut(app).hydrate(sub_tree)?;
        }
        if let Some(algorithms) = read_string_list(tree, keys::SIGNING_ALGORITHMS) {
            self.signing_algorithms = Some(algorithms);
        }
        if let Some(enabled) = read_tree(tree, keys::ENABLED_PROFILES) {
            self.enabled_profiles.hydrate_from(enabled);
        }
        Ok(())
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        match &self.identity_provider {
            None => errors.add(keys::IDENTITY_PROVIDER, FieldRule::Required),
            Some(idp) => errors.scope(keys::IDENTITY_PROVIDER, |errors| idp.validate(errors)),
        }
        match &self.application_provider {
            None => errors.add(keys::APPLICATION_PROVIDER, FieldRule::Required),
            Some(app) => errors.scope(keys::APPLICATION_PROVIDER, |errors| app.validate(errors)),
        }
        if require(errors, keys::SIGNING_ALGORITHMS, &self.signing_algorithms)
            && self.signing_algorithms.as_ref().is_some_and(Vec::is_empty)
        {
            errors.add(keys::SIGNING_ALGORITHMS, FieldRule::Empty);
        }
        for algorithm in self.signing_algorithms.iter().flatten() {
            if self.config.is_signing_algorithm_disallowed(algorithm) {
                errors.add(
                    keys::SIGNING_ALGORITHMS,
                    FieldRule::DisallowedAlgorithm(algorithm.clone()),
                );
            }
        }
        errors.scope(keys::ENABLED_PROFILES, |errors| {
            self.enabled_profiles.validate_against(self, errors)
        });
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = JsonTree::new();
        put_tree(
            &mut tree,
            keys::IDENTITY_PROVIDER,
            self.identity_provider.as_ref().map(|idp| idp.to_tree()),
        );
        put_tree(
            &mut tree,
            keys::APPLICATION_PROVIDER,
            self.application_provider.as_ref().map(|app| app.to_tree()),
        );
        put_string_list(&mut tree, keys::SIGNING_ALGORITHMS, &self.signing_algorithms);
        put_tree(
            &mut tree,
            keys::ENABLED_PROFILES,
            Some(self.enabled_profiles.to_tree()),
        );
        tree
    }
}

impl PartialEq for Contract {
    fn eq(&self, other: &Self) -> bool {
        self.identity_provider == other.identity_provider
            && self.application_provider == other.application_provider
            && self.signing_algorithms == other.signing_algorithms
            && self.enabled_profiles == other.enabled_profiles
    }
}

impl Eq for Contract {}

impl Hash for Contract {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_tree(&self.to_tree(), state);
    }
}
