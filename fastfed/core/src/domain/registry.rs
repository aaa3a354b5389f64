// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Profile Registry - URN-keyed table of installed FastFed profiles
//
// Consulted whenever an extension map needs to know which extension to
// instantiate for a URN. Built once (usually from `ProfileRegistry::known()`),
// optionally customized, then shared read-only through the configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::domain::profile::{Profile, ProfileType};
use crate::domain::profiles::enterprise_saml::EnterpriseSamlProfile;
use crate::domain::profiles::enterprise_scim::EnterpriseScimProfile;

/// Registry of installed profiles keyed by URN (exact, case-sensitive match)
#[derive(Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, Arc<dyn Profile>>,
}

impl ProfileRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every profile this crate ships
    pub fn known() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EnterpriseSamlProfile));
        registry.register(Arc::new(EnterpriseScimProfile));
        registry
    }

    /// Install `profile`, replacing any profile already registered under its URN
    pub fn register(&mut self, profile: Arc<dyn Profile>) {
        let urn = profile.urn().to_string();
        if self.profiles.insert(urn.clone(), profile).is_some() {
            info!("Replaced profile registration for '{}'", urn);
        } else {
            info!("Registered profile '{}'", urn);
        }
    }

    /// Copy of this registry with `profile` installed; `self` is left untouched
    pub fn with_profile(&self, profile: Arc<dyn Profile>) -> Self {
        let mut copy = self.clone();
        copy.register(profile);
        copy
    }

    /// Look up a profile by URN. Absence is a normal outcome.
    pub fn resolve(&self, urn: &str) -> Option<Arc<dyn Profile>> {
        self.profiles.get(urn).cloned()
    }

    pub fn contains(&self, urn: &str) -> bool {
        self.profiles.contains_key(urn)
    }

    pub fn profile_type(&self, urn: &str) -> Option<ProfileType> {
        self.profiles.get(urn).map(|profile| profile.profile_type())
    }

    /// Installed URNs in sorted order
    pub fn urns(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl fmt::Debug for ProfileRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.profiles.keys()).finish()
    }
}
