// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Capability Negotiation
//!
//! Decides whether an identity provider and an application provider can
//! federate and assembles the [`Contract`] they would agree on.
//!
//! # DDD Pattern: Domain Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Compatibility check, enabled-profile partitioning,
//!   signing-algorithm agreement
//! - **Collaborators:**
//!   - Domain: IdentityProvider, ApplicationProvider, Contract, ProfileRegistry
//!
//! # Flow
//!
//! 1. Collect the requested profile URNs (explicit, or the union of both sides' declarations)
//! 2. Check each URN, in sorted order, against the identity provider then the application provider
//! 3. Partition the URNs into authentication / provisioning by registry type
//! 4. Agree on signing algorithms under the configured [`SigningAlgorithmPolicy`]
//! 5. Reject any agreed algorithm on the disallowed list
//!
//! Both providers are expected to have passed validation already
//! (see [`crate::application::metadata_service::MetadataService`]).
//! Every failure is raised at the point of detection; nothing is accumulated.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::config::{FastFedConfiguration, SigningAlgorithmPolicy};
use crate::domain::contract::{Contract, EnabledProfiles};
use crate::domain::errors::{FastFedError, Incompatibility, Result};
use crate::domain::provider::{ApplicationProvider, IdentityProvider, ProviderSide};

pub struct CapabilityNegotiator {
    config: Arc<FastFedConfiguration>,
}

impl CapabilityNegotiator {
    pub fn new(config: Arc<FastFedConfiguration>) -> Self {
        Self { config }
    }

    /// Fail with the first requested URN missing from either side.
    pub fn check_compatibility<'a, I>(
        &self,
        identity_provider: &IdentityProvider,
        application_provider: &ApplicationProvider,
        requested: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let requested: BTreeSet<&str> = requested.into_iter().collect();
        for urn in requested {
            let missing_from = if !identity_provider.metadata_extensions().contains(urn) {
                Some(ProviderSide::IdentityProvider)
            } else if !application_provider.metadata_extensions().contains(urn) {
                Some(ProviderSide::ApplicationProvider)
            } else {
                None
            };

            if let Some(missing_from) = missing_from {
                warn!(urn = %urn, missing_from = %missing_from, "Providers are incompatible");
                return Err(FastFedError::IncompatibleProviders(
                    Incompatibility::MissingProfile {
                        urn: urn.to_string(),
                        missing_from,
                    },
                ));
            }
        }
        Ok(())
    }

    /// Negotiate every profile either side declares.
    pub fn negotiate(
        &self,
        identity_provider: Arc<IdentityProvider>,
        application_provider: Arc<ApplicationProvider>,
    ) -> Result<Contract> {
        let requested: BTreeSet<String> = identity_provider
            .metadata_extensions()
            .urns()
            .chain(application_provider.metadata_extensions().urns())
            .map(str::to_string)
            .collect();
        self.negotiate_profiles(
            identity_provider,
            application_provider,
            requested.iter().map(String::as_str),
        )
    }

    /// Negotiate exactly the `requested` profiles.
    pub fn negotiate_profiles<'a, I>(
        &self,
        identity_provider: Arc<IdentityProvider>,
        application_provider: Arc<ApplicationProvider>,
        requested: I,
    ) -> Result<Contract>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let requested: BTreeSet<&str> = requested.into_iter().collect();
        self.check_compatibility(
            &identity_provider,
            &application_provider,
            requested.iter().copied(),
        )?;

        let mut enabled_profiles = EnabledProfiles::default();
        for urn in requested {
            let profile_type = self.config.registry().profile_type(urn).ok_or_else(|| {
                FastFedError::Internal(format!(
                    "profile '{urn}' is present on both sides but not installed in the registry"
                ))
            })?;
            enabled_profiles.insert(urn, profile_type);
        }

        let signing_algorithms =
            self.agree_signing_algorithms(&identity_provider, &application_provider)?;

        info!(
            identity_provider = ?identity_provider.provider.entity_id,
            application_provider = ?application_provider.provider.entity_id,
            authentication_profiles = enabled_profiles.authentication_profiles.len(),
            provisioning_profiles = enabled_profiles.provisioning_profiles.len(),
            signing_algorithms = ?signing_algorithms,
            "Negotiated FastFed contract"
        );

        Ok(Contract::between(
            self.config.clone(),
            identity_provider,
            application_provider,
            signing_algorithms,
            enabled_profiles,
        ))
    }

    /// Apply the configured policy to both sides' advertised algorithms.
    pub fn agree_signing_algorithms(
        &self,
        identity_provider: &IdentityProvider,
        application_provider: &ApplicationProvider,
    ) -> Result<Vec<String>> {
        let idp_algorithms = identity_provider.provider.signing_algorithms();
        let app_algorithms = application_provider.provider.signing_algorithms();

        let mut common: Vec<String> = Vec::new();
        for algorithm in idp_algorithms {
            if app_algorithms.contains(algorithm) && !common.contains(algorithm) {
                common.push(algorithm.clone());
            }
        }
        if self.config.signing_algorithm_policy() == SigningAlgorithmPolicy::MostPreferred {
            common.truncate(1);
        }

        if common.is_empty() {
            warn!("No common signing algorithm between providers");
            return Err(FastFedError::IncompatibleProviders(
                Incompatibility::NoCommonSigningAlgorithm {
                    identity_provider: idp_algorithms.to_vec(),
                    application_provider: app_algorithms.to_vec(),
                },
            ));
        }

        if let Some(disallowed) = common
            .iter()
            .find(|algorithm| self.config.is_signing_algorithm_disallowed(algorithm))
        {
            warn!(algorithm = %disallowed, "Disallowed signing algorithm agreed");
            return Err(FastFedError::Security(format!(
                "signing algorithm '{disallowed}' is not permitted"
            )));
        }

        Ok(common)
    }
}
