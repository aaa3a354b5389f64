// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Enterprise SAML - authentication profile
//
// Extends the application provider metadata (desired attributes) and both
// registration messages (the party's SAML metadata document location).

use serde_json::Value;

use crate::domain::config::{FastFedConfiguration, SchemaGrammar};
use crate::domain::desired_attributes::DesiredAttributes;
use crate::domain::errors::{ErrorAccumulator, Result};
use crate::domain::keys;
use crate::domain::metadata::{hydrate_nested, require_nested, require_url, Metadata};
use crate::domain::profile::{ExtensionPoint, Profile, ProfileExtension, ProfileType};
use crate::domain::tree::{as_tree, put_string, put_tree, read_string, JsonTree};

pub const ENTERPRISE_SAML_URN: &str =
    "urn:ietf:params:fastfed:1.0:authentication:saml:2.0:enterprise";

#[derive(Debug, Clone, Copy, Default)]
pub struct EnterpriseSamlProfile;

impl Profile for EnterpriseSamlProfile {
    fn urn(&self) -> &str {
        ENTERPRISE_SAML_URN
    }

    fn profile_type(&self) -> ProfileType {
        ProfileType::Authentication
    }

    fn supports(&self, point: ExtensionPoint) -> bool {
        !matches!(point, ExtensionPoint::IdentityProviderMetadata)
    }

    fn make_extension(
        &self,
        point: ExtensionPoint,
        config: &FastFedConfiguration,
    ) -> Option<Box<dyn ProfileExtension>> {
        match point {
            ExtensionPoint::ApplicationProviderMetadata => Some(Box::new(
                SamlApplicationMetadata::new(config.preferred_schema_grammar()),
            )),
            ExtensionPoint::RegistrationRequest | ExtensionPoint::RegistrationResponse => {
                Some(Box::new(SamlMetadataExchange::new(point)))
            }
            ExtensionPoint::IdentityProviderMetadata => None,
        }
    }
}

/// SAML attributes the application provider wants asserted at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlApplicationMetadata {
    grammar: SchemaGrammar,
    pub desired_attributes: Option<DesiredAttributes>,
}

impl SamlApplicationMetadata {
    pub fn new(grammar: SchemaGrammar) -> Self {
        Self {
            grammar,
            desired_attributes: None,
        }
    }
}

impl Metadata for SamlApplicationMetadata {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        let grammar = self.grammar;
        hydrate_nested(tree, keys::DESIRED_ATTRIBUTES, &mut self.desired_attributes, || {
            DesiredAttributes::new(grammar)
        })
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        require_nested(errors, keys::DESIRED_ATTRIBUTES, &self.desired_attributes);
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = JsonTree::new();
        put_tree(
            &mut tree,
            keys::DESIRED_ATTRIBUTES,
            self.desired_attributes.as_ref().map(|attributes| attributes.to_tree()),
        );
        tree
    }
}

impl ProfileExtension for SamlApplicationMetadata {
    fn profile_urn(&self) -> &str {
        ENTERPRISE_SAML_URN
    }

    fn extension_point(&self) -> ExtensionPoint {
        ExtensionPoint::ApplicationProviderMetadata
    }

    fn clone_extension(&self) -> Box<dyn ProfileExtension> {
        Box::new(self.clone())
    }
}

/// Location of a party's SAML metadata, exchanged in the registration request
/// (identity provider) and the registration response (application provider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlMetadataExchange {
    point: ExtensionPoint,
    pub saml_metadata_uri: Option<String>,
}

impl SamlMetadataExchange {
    pub fn new(point: ExtensionPoint) -> Self {
        Self {
            point,
            saml_metadata_uri: None,
        }
    }
}

impl Metadata for SamlMetadataExchange {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        if let Some(uri) = read_string(tree, keys::SAML_METADATA_URI) {
            self.saml_metadata_uri = Some(uri);
        }
        Ok(())
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        require_url(errors, keys::SAML_METADATA_URI, &self.saml_metadata_uri);
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = JsonTree::new();
        put_string(&mut tree, keys::SAML_METADATA_URI, &self.saml_metadata_uri);
        tree
    }
}

impl ProfileExtension for SamlMetadataExchange {
    fn profile_urn(&self) -> &str {
        ENTERPRISE_SAML_URN
    }

    fn extension_point(&self) -> ExtensionPoint {
        self.point
    }

    fn clone_extension(&self) -> Box<dyn ProfileExtension> {
        Box::new(self.clone())
    }
}
