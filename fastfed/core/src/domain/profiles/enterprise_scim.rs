// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Enterprise SCIM Provisioning Profile
//!
//! | Extension point | Extension | Fields |
//! |-----------------|-----------|--------|
//! | Application provider metadata | [`ScimApplicationMetadata`] | `desired_attributes`, `can_support_nested_groups`, `max_group_membership_changes` |
//! | Registration response | [`ScimRegistrationResponse`] | `scim_service_uri`, `provider_authentication_method`, `token_endpoint`, `scope` |
//!
//! The identity provider publishes nothing for this profile; it provisions into
//! the application provider's SCIM service using the OAuth 2.0 JWT bearer
//! profile against the advertised token endpoint.

use serde_json::Value;

use crate::domain::config::{
    FastFedConfiguration, SchemaGrammar, MAX_GROUP_MEMBERSHIP_CHANGES,
    MIN_GROUP_MEMBERSHIP_CHANGES,
};
use crate::domain::desired_attributes::DesiredAttributes;
use crate::domain::errors::{ErrorAccumulator, FieldRule, Result};
use crate::domain::keys;
use crate::domain::metadata::{
    hydrate_nested, require, require_nested, require_url, Metadata, Recognized,
};
use crate::domain::profile::{ExtensionPoint, Profile, ProfileExtension, ProfileType};
use crate::domain::tree::{
    as_tree, put_bool, put_string, put_tree, put_u64, read_bool, read_string, read_u64, JsonTree,
};

pub const ENTERPRISE_SCIM_URN: &str =
    "urn:ietf:params:fastfed:1.0:provisioning:scim:2.0:enterprise";

/// The only provider authentication method this profile accepts.
pub const OAUTH2_JWT_PROVIDER_AUTHENTICATION_URN: &str =
    "urn:ietf:params:fastfed:1.0:provider_authentication:oauth:2.0:jwt_profile";

#[derive(Debug, Clone, Copy, Default)]
pub struct EnterpriseScimProfile;

impl Profile for EnterpriseScimProfile {
    fn urn(&self) -> &str {
        ENTERPRISE_SCIM_URN
    }

    fn profile_type(&self) -> ProfileType {
        ProfileType::Provisioning
    }

    fn supports(&self, point: ExtensionPoint) -> bool {
        matches!(
            point,
            ExtensionPoint::ApplicationProviderMetadata | ExtensionPoint::RegistrationResponse
        )
    }

    fn make_extension(
        &self,
        point: ExtensionPoint,
        config: &FastFedConfiguration,
    ) -> Option<Box<dyn ProfileExtension>> {
        match point {
            ExtensionPoint::ApplicationProviderMetadata => {
                Some(Box::new(ScimApplicationMetadata::new(config)))
            }
            ExtensionPoint::RegistrationResponse => Some(Box::new(ScimRegistrationResponse::default())),
            _ => None,
        }
    }
}

/// Provisioning limits and attributes requested by the application provider.
///
/// Starts from the deployment's configured SCIM settings; values present in a
/// hydrated tree override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScimApplicationMetadata {
    grammar: SchemaGrammar,
    pub desired_attributes: Option<DesiredAttributes>,
    pub can_support_nested_groups: Option<bool>,
    pub max_group_membership_changes: Option<u64>,
}

impl ScimApplicationMetadata {
    pub fn new(config: &FastFedConfiguration) -> Self {
        let scim = config.scim();
        Self {
            grammar: config.preferred_schema_grammar(),
            desired_attributes: None,
            can_support_nested_groups: Some(scim.can_support_nested_groups),
            max_group_membership_changes: Some(u64::from(scim.max_group_membership_changes)),
        }
    }
}

impl Metadata for ScimApplicationMetadata {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        let grammar = self.grammar;
        hydrate_nested(tree, keys::DESIRED_ATTRIBUTES, &mut self.desired_attributes, || {
            DesiredAttributes::new(grammar)
        })?;
        if let Some(nested) = read_bool(tree, keys::CAN_SUPPORT_NESTED_GROUPS) {
            self.can_support_nested_groups = Some(nested);
        }
        if let Some(max) = read_u64(tree, keys::MAX_GROUP_MEMBERSHIP_CHANGES) {
            self.max_group_membership_changes = Some(max);
        }
        Ok(())
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        require_nested(errors, keys::DESIRED_ATTRIBUTES, &self.desired_attributes);
        require(errors, keys::CAN_SUPPORT_NESTED_GROUPS, &self.can_support_nested_groups);

        let min = u64::from(MIN_GROUP_MEMBERSHIP_CHANGES);
        let max = u64::from(MAX_GROUP_MEMBERSHIP_CHANGES);
        match self.max_group_membership_changes {
            None => errors.add(keys::MAX_GROUP_MEMBERSHIP_CHANGES, FieldRule::Required),
            Some(value) if !(min..=max).contains(&value) => errors.add(
                keys::MAX_GROUP_MEMBERSHIP_CHANGES,
                FieldRule::OutOfRange { value, min, max },
            ),
            Some(_) => {}
        }
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = JsonTree::new();
        put_tree(
            &mut tree,
            keys::DESIRED_ATTRIBUTES,
            self.desired_attributes.as_ref().map(|attributes| attributes.to_tree()),
        );
        put_bool(&mut tree, keys::CAN_SUPPORT_NESTED_GROUPS, self.can_support_nested_groups);
        put_u64(
            &mut tree,
            keys::MAX_GROUP_MEMBERSHIP_CHANGES,
            self.max_group_membership_changes,
        );
        tree
    }
}

impl ProfileExtension for ScimApplicationMetadata {
    fn profile_urn(&self) -> &str {
        ENTERPRISE_SCIM_URN
    }

    fn extension_point(&self) -> ExtensionPoint {
        ExtensionPoint::ApplicationProviderMetadata
    }

    fn clone_extension(&self) -> Box<dyn ProfileExtension> {
        Box::new(self.clone())
    }
}

/// How the identity provider authenticates to the SCIM service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderAuthenticationMethod {
    OAuth2Jwt,
}

impl ProviderAuthenticationMethod {
    pub fn urn(&self) -> &'static str {
        match self {
            Self::OAuth2Jwt => OAUTH2_JWT_PROVIDER_AUTHENTICATION_URN,
        }
    }

    fn parse(value: &str) -> Recognized<Self> {
        if value == OAUTH2_JWT_PROVIDER_AUTHENTICATION_URN {
            Recognized::Known(Self::OAuth2Jwt)
        } else {
            Recognized::Unknown(value.to_string())
        }
    }
}

/// The application provider's SCIM endpoint and the credentials flow used to reach it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScimRegistrationResponse {
    pub scim_service_uri: Option<String>,
    pub provider_authentication_method: Option<Recognized<ProviderAuthenticationMethod>>,
    pub token_endpoint: Option<String>,
    pub scope: Option<String>,
}

impl Metadata for ScimRegistrationResponse {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        if let Some(uri) = read_string(tree, keys::SCIM_SERVICE_URI) {
            self.scim_service_uri = Some(uri);
        }
        if let Some(method) = read_string(tree, keys::PROVIDER_AUTHENTICATION_METHOD) {
            self.provider_authentication_method = Some(ProviderAuthenticationMethod::parse(&method));
        }
        if let Some(endpoint) = read_string(tree, keys::TOKEN_ENDPOINT) {
            self.token_endpoint = Some(endpoint);
        }
        if let Some(scope) = read_string(tree, keys::SCOPE) {
            self.scope = Some(scope);
        }
        Ok(())
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        require_url(errors, keys::SCIM_SERVICE_URI, &self.scim_service_uri);
        match &self.provider_authentication_method {
            None => errors.add(keys::PROVIDER_AUTHENTICATION_METHOD, FieldRule::Required),
            Some(Recognized::Unknown(value)) => errors.add(
                keys::PROVIDER_AUTHENTICATION_METHOD,
                FieldRule::Unrecognized(value.clone()),
            ),
            Some(Recognized::Known(_)) => {}
        }
        require_url(errors, keys::TOKEN_ENDPOINT, &self.token_endpoint);
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = JsonTree::new();
        put_string(&mut tree, keys::SCIM_SERVICE_URI, &self.scim_service_uri);
        let method = self.provider_authentication_method.as_ref().map(|method| match method {
            Recognized::Known(method) => method.urn().to_string(),
            Recognized::Unknown(value) => value.clone(),
        });
        put_string(&mut tree, keys::PROVIDER_AUTHENTICATION_METHOD, &method);
        put_string(&mut tree, keys::TOKEN_ENDPOINT, &self.token_endpoint);
        put_string(&mut tree, keys::SCOPE, &self.scope);
        tree
    }
}

impl ProfileExtension for ScimRegistrationResponse {
    fn profile_urn(&self) -> &str {
        ENTERPRISE_SCIM_URN
    }

    fn extension_point(&self) -> ExtensionPoint {
        ExtensionPoint::RegistrationResponse
    }

    fn clone_extension(&self) -> Box<dyn ProfileExtension> {
        Box::new(self.clone())
    }
}
