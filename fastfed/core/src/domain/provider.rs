// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Provider Metadata
//!
//! The two federation parties and the fields they share.
//!
//! | Type | Adds to [`Provider`] | Extension maps |
//! |------|----------------------|----------------|
//! | [`IdentityProvider`] | `jwks_uri`, `fastfed_handshake_start_uri` | identity provider metadata, `registration_request` |
//! | [`ApplicationProvider`] | `fastfed_handshake_register_uri`, `fastfed_handshake_finalize_uri` | application provider metadata, `registration_response` |
//!
//! Metadata-point extensions sit flatly in the provider object under their
//! profile URN. Registration extensions sit one level down, under
//! `registration_request` / `registration_response`, and are only hydrated when
//! that sub-object is present.
//!
//! Every profile declared in `capabilities` gets an entry in the provider's
//! metadata-point map, so "does this side support URN X" is answered by
//! [`ExtensionMap::contains`] regardless of whether the profile carries data at
//! that point.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::domain::config::FastFedConfiguration;
use crate::domain::errors::{ErrorAccumulator, FieldRule, Result};
use crate::domain::keys;
use crate::domain::metadata::{
    check_url, hydrate_nested, require_nested, require_string, require_url, Metadata,
};
use crate::domain::profile::{ExtensionMap, ExtensionPoint, ProfileType};
use crate::domain::provider_details::{Capabilities, ContactInformation, DisplaySettings};
use crate::domain::tree::{
    as_tree, hash_tree, put_string, put_tree, read_string, read_tree, urn_keys, JsonTree,
};

/// Which party of a federation relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSide {
    IdentityProvider,
    ApplicationProvider,
}

impl ProviderSide {
    /// Top-level document key wrapping this side's metadata.
    pub fn document_key(&self) -> &'static str {
        match self {
            Self::IdentityProvider => keys::IDENTITY_PROVIDER,
            Self::ApplicationProvider => keys::APPLICATION_PROVIDER,
        }
    }
}

impl fmt::Display for ProviderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentityProvider => f.write_str("identity provider"),
            Self::ApplicationProvider => f.write_str("application provider"),
        }
    }
}

/// Fields common to both provider kinds.
#[derive(Debug, Clone)]
pub struct Provider {
    config: Arc<FastFedConfiguration>,
    pub entity_id: Option<String>,
    pub provider_domain: Option<String>,
    pub contact_information: Option<ContactInformation>,
    pub display_settings: Option<DisplaySettings>,
    pub capabilities: Option<Capabilities>,
}

impl Provider {
    pub fn new(config: Arc<FastFedConfiguration>) -> Self {
        Self {
            config,
            entity_id: None,
            provider_domain: None,
            contact_information: None,
            display_settings: None,
            capabilities: None,
        }
    }

    pub fn config(&self) -> &Arc<FastFedConfiguration> {
        &self.config
    }

    /// Profile URNs listed under `capabilities`, authentication first.
    pub fn declared_profiles(&self) -> Vec<String> {
        self.capabilities
            .iter()
            .flat_map(|capabilities| capabilities.declared_profiles())
            .map(str::to_string)
            .collect()
    }

    /// Advertised signing algorithms in order of preference.
    pub fn signing_algorithms(&self) -> &[String] {
        self.capabilities
            .as_ref()
            .map(Capabilities::signing_algorithms)
            .unwrap_or_default()
    }

    /// Resolve the declared profiles and any flat `urn:` keys of `tree` into `map`.
    fn hydrate_extensions(&self, map: &mut ExtensionMap, tree: &JsonTree) -> Result<()> {
        if let Some(capabilities) = &self.capabilities {
            let declared = [
                (keys::AUTHENTICATION_PROFILES, &capabilities.authentication_profiles),
                (keys::PROVISIONING_PROFILES, &capabilities.provisioning_profiles),
            ];
            for (key, urns) in declared {
                let field = format!("{}.{}", keys::CAPABILITIES, key);
                let urns = urns.iter().flatten().map(String::as_str);
                map.hydrate_profiles(Some(field.as_str()), urns, Some(tree))?;
            }
        }
        map.hydrate_profiles(None, urn_keys(tree), Some(tree))
    }

    /// Hydrate a registration sub-object into a fresh map when present.
    fn hydrate_registration(
        &self,
        point: ExtensionPoint,
        tree: &JsonTree,
        key: &str,
        slot: &mut Option<ExtensionMap>,
    ) -> Result<()> {
        let Some(sub_tree) = read_tree(tree, key) else {
            return Ok(());
        };
        let map = slot.get_or_insert_with(|| ExtensionMap::new(point, self.config.clone()));
        let declared = self.declared_profiles();
        let recognized = declared
            .iter()
            .map(String::as_str)
            .filter(|urn| self.config.registry().contains(urn));
        map.hydrate_profiles(None, recognized, Some(sub_tree))?;
        map.hydrate_profiles(None, urn_keys(sub_tree), Some(sub_tree))
    }

    /// Every URN listed under a profile-type key must resolve to a profile of that type.
    fn validate_profile_types(&self, errors: &mut ErrorAccumulator) {
        let Some(capabilities) = &self.capabilities else {
            return;
        };
        let declared = [
            (
                keys::AUTHENTICATION_PROFILES,
                ProfileType::Authentication,
                &capabilities.authentication_profiles,
            ),
            (
                keys::PROVISIONING_PROFILES,
                ProfileType::Provisioning,
                &capabilities.provisioning_profiles,
            ),
        ];
        errors.scope(keys::CAPABILITIES, |errors| {
            for (key, expected, urns) in declared {
                for urn in urns.iter().flatten() {
                    match self.config.registry().profile_type(urn) {
                        Some(actual) if actual != expected => errors.add(
                            key,
                            FieldRule::ProfileTypeMismatch {
                                urn: urn.clone(),
                                expected,
                            },
                        ),
                        _ => {}
                    }
                }
            }
        });
    }
}

impl Metadata for Provider {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        if let Some(entity_id) = read_string(tree, keys::ENTITY_ID) {
            self.entity_id = Some(entity_id);
        }
        if let Some(domain) = read_string(tree, keys::PROVIDER_DOMAIN) {
            self.provider_domain = Some(domain);
        }
        hydrate_nested(
            tree,
            keys::PROVIDER_CONTACT_INFORMATION,
            &mut self.contact_information,
            ContactInformation::default,
        )?;
        hydrate_nested(
            tree,
            keys::DISPLAY_SETTINGS,
            &mut self.display_settings,
            DisplaySettings::default,
        )?;
        hydrate_nested(tree, keys::CAPABILITIES, &mut self.capabilities, Capabilities::default)
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        require_url(errors, keys::ENTITY_ID, &self.entity_id);
        require_string(errors, keys::PROVIDER_DOMAIN, &self.provider_domain);
        require_nested(errors, keys::PROVIDER_CONTACT_INFORMATION, &self.contact_information);
        require_nested(errors, keys::DISPLAY_SETTINGS, &self.display_settings);
        require_nested(errors, keys::CAPABILITIES, &self.capabilities);
        self.validate_profile_types(errors);
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = JsonTree::new();
        put_string(&mut tree, keys::ENTITY_ID, &self.entity_id);
        put_string(&mut tree, keys::PROVIDER_DOMAIN, &self.provider_domain);
        put_tree(
            &mut tree,
            keys::PROVIDER_CONTACT_INFORMATION,
            self.contact_information.as_ref().map(|contact| contact.to_tree()),
        );
        put_tree(
            &mut tree,
            keys::DISPLAY_SETTINGS,
            self.display_settings.as_ref().map(|settings| settings.to_tree()),
        );
        put_tree(
            &mut tree,
            keys::CAPABILITIES,
            self.capabilities.as_ref().map(|capabilities| capabilities.to_tree()),
        );
        tree
    }
}

impl PartialEq for Provider {
    fn eq(&self, other: &Self) -> bool {
        self.entity_id == other.entity_id
            && self.provider_domain == other.provider_domain
            && self.contact_information == other.contact_information
            && self.display_settings == other.display_settings
            && self.capabilities == other.capabilities
    }
}

impl Eq for Provider {}

/// Wrap `tree` under `side`'s document key.
fn into_document(side: ProviderSide, tree: JsonTree) -> Value {
    let mut document = JsonTree::new();
    document.insert(side.document_key().to_string(), Value::Object(tree));
    Value::Object(document)
}

// ============================================================================
// Identity Provider
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProvider {
    pub provider: Provider,
    pub jwks_uri: Option<String>,
    pub fastfed_handshake_start_uri: Option<String>,
    metadata_extensions: ExtensionMap,
    registration_request: Option<ExtensionMap>,
}

impl IdentityProvider {
    pub fn new(config: Arc<FastFedConfiguration>) -> Self {
        Self {
            metadata_extensions: ExtensionMap::new(
                ExtensionPoint::IdentityProviderMetadata,
                config.clone(),
            ),
            provider: Provider::new(config),
            jwks_uri: None,
            fastfed_handshake_start_uri: None,
            registration_request: None,
        }
    }

    /// Hydrate from a `{"identity_provider": {...}}` document. Does not validate.
    pub fn from_document(config: Arc<FastFedConfiguration>, document: &Value) -> Result<Self> {
        let mut provider = Self::new(config);
        provider.hydrate(document.get(keys::IDENTITY_PROVIDER).unwrap_or(&Value::Null))?;
        Ok(provider)
    }

    pub fn to_document(&self) -> Value {
        into_document(ProviderSide::IdentityProvider, self.to_tree())
    }

    pub fn metadata_extensions(&self) -> &ExtensionMap {
        &self.metadata_extensions
    }

    pub fn metadata_extensions_mut(&mut self) -> &mut ExtensionMap {
        &mut self.metadata_extensions
    }

    pub fn registration_request(&self) -> Option<&ExtensionMap> {
        self.registration_request.as_ref()
    }

    /// The registration-request map, created empty on first use.
    pub fn registration_request_mut(&mut self) -> &mut ExtensionMap {
        let config = self.provider.config().clone();
        self.registration_request
            .get_or_insert_with(|| ExtensionMap::new(ExtensionPoint::RegistrationRequest, config))
    }
}

impl Metadata for IdentityProvider {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        self.provider.hydrate(tree)?;
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        if let Some(uri) = read_string(tree, keys::JWKS_URI) {
            self.jwks_uri = Some(uri);
        }
        if let Some(uri) = read_string(tree, keys::FASTFED_HANDSHAKE_START_URI) {
            self.fastfed_handshake_start_uri = Some(uri);
        }
        self.provider
            .hydrate_extensions(&mut self.metadata_extensions, tree)?;
        self.provider.hydrate_registration(
            ExtensionPoint::RegistrationRequest,
            tree,
            keys::REGISTRATION_REQUEST,
            &mut self.registration_request,
        )
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        self.provider.validate(errors);
        require_url(errors, keys::JWKS_URI, &self.jwks_uri);
        require_url(
            errors,
            keys::FASTFED_HANDSHAKE_START_URI,
            &self.fastfed_handshake_start_uri,
        );
        self.metadata_extensions.validate(errors);
        if let Some(registration) = &self.registration_request {
            errors.scope(keys::REGISTRATION_REQUEST, |errors| registration.validate(errors));
        }
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = self.provider.to_tree();
        put_string(&mut tree, keys::JWKS_URI, &self.jwks_uri);
        put_string(
            &mut tree,
            keys::FASTFED_HANDSHAKE_START_URI,
            &self.fastfed_handshake_start_uri,
        );
        self.metadata_extensions.write_into(&mut tree);
        put_tree(
            &mut tree,
            keys::REGISTRATION_REQUEST,
            self.registration_request.as_ref().map(ExtensionMap::to_tree),
        );
        tree
    }
}

impl Hash for IdentityProvider {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_tree(&self.to_tree(), state);
    }
}

// ============================================================================
// Application Provider
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationProvider {
    pub provider: Provider,
    pub fastfed_handshake_register_uri: Option<String>,
    pub fastfed_handshake_finalize_uri: Option<String>,
    metadata_extensions: ExtensionMap,
    registration_response: Option<ExtensionMap>,
}

impl ApplicationProvider {
    pub fn new(config: Arc<FastFedConfiguration>) -> Self {
        Self {
            metadata_extensions: ExtensionMap::new(
                ExtensionPoint::ApplicationProviderMetadata,
                config.clone(),
            ),
            provider: Provider::new(config),
            fastfed_handshake_register_uri: None,
            fastfed_handshake_finalize_uri: None,
            registration_response: None,
        }
    }

    /// Hydrate from a `{"application_provider": {...}}` document. Does not validate.
    pub fn from_document(config: Arc<FastFedConfiguration>, document: &Value) -> Result<Self> {
        let mut provider = Self::new(config);
        provider.hydrate(document.get(keys::APPLICATION_PROVIDER).unwrap_or(&Value::Null))?;
        Ok(provider)
    }

    pub fn to_document(&self) -> Value {
        into_document(ProviderSide::ApplicationProvider, self.to_tree())
    }

    pub fn metadata_extensions(&self) -> &ExtensionMap {
        &self.metadata_extensions
    }

    pub fn metadata_extensions_mut(&mut self) -> &mut ExtensionMap {
        &mut self.metadata_extensions
    }

    pub fn registration_response(&self) -> Option<&ExtensionMap> {
        self.registration_response.as_ref()
    }

    /// The registration-response map, created empty on first use.
    pub fn registration_response_mut(&mut self) -> &mut ExtensionMap {
        let config = self.provider.config().clone();
        self.registration_response
            .get_or_insert_with(|| ExtensionMap::new(ExtensionPoint::RegistrationResponse, config))
    }
}

impl Metadata for ApplicationProvider {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        self.provider.hydrate(tree)?;
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        if let Some(uri) = read_string(tree, keys::FASTFED_HANDSHAKE_REGISTER_URI) {
            self.fastfed_handshake_register_uri = Some(uri);
        }
        if let Some(uri) = read_string(tree, keys::FASTFED_HANDSHAKE_FINALIZE_URI) {
            self.fastfed_handshake_finalize_uri = Some(uri);
        }
        self.provider
            .hydrate_extensions(&mut self.metadata_extensions, tree)?;
        self.provider.hydrate_registration(
            ExtensionPoint::RegistrationResponse,
            tree,
            keys::REGISTRATION_RESPONSE,
            &mut self.registration_response,
        )
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        self.provider.validate(errors);
        require_url(
            errors,
            keys::FASTFED_HANDSHAKE_REGISTER_URI,
            &self.fastfed_handshake_register_uri,
        );
        check_url(
            errors,
            keys::FASTFED_HANDSHAKE_FINALIZE_URI,
            &self.fastfed_handshake_finalize_uri,
        );
        self.metadata_extensions.validate(errors);
        if let Some(registration) = &self.registration_response {
            errors.scope(keys::REGISTRATION_RESPONSE, |errors| registration.validate(errors));
        }
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = self.provider.to_tree();
        put_string(
            &mut tree,
            keys::FASTFED_HANDSHAKE_REGISTER_URI,
            &self.fastfed_handshake_register_uri,
        );
        put_string(
            &mut tree,
            keys::FASTFED_HANDSHAKE_FINALIZE_URI,
            &self.fastfed_handshake_finalize_uri,
        );
        self.metadata_extensions.write_into(&mut tree);
        put_tree(
            &mut tree,
            keys::REGISTRATION_RESPONSE,
            self.registration_response.as_ref().map(ExtensionMap::to_tree),
        );
        tree
    }
}

impl Hash for ApplicationProvider {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_tree(&self.to_tree(), state);
    }
}
