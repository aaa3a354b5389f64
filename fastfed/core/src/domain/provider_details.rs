// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Provider Details - nested objects shared by both provider kinds
//
// `provider_contact_information`, `display_settings` and `capabilities`.
// Profile URNs in `capabilities` are checked against the registry by the
// owning provider, which has the configuration at hand.

use serde_json::Value;

use crate::domain::config::{SchemaGrammar, KNOWN_SIGNING_ALGORITHMS};
use crate::domain::errors::{ErrorAccumulator, FieldRule, Result};
use crate::domain::keys;
use crate::domain::metadata::{check_url, require, require_string, Metadata, Recognized};
use crate::domain::tree::{as_tree, put_string, put_string_list, read_string, read_string_list, JsonTree};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContactInformation {
    pub organization: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Metadata for ContactInformation {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        if let Some(organization) = read_string(tree, keys::ORGANIZATION) {
            self.organization = Some(organization);
        }
        if let Some(phone) = read_string(tree, keys::PHONE) {
            self.phone = Some(phone);
        }
        if let Some(email) = read_string(tree, keys::EMAIL) {
            self.email = Some(email);
        }
        Ok(())
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        require_string(errors, keys::ORGANIZATION, &self.organization);
        require_string(errors, keys::EMAIL, &self.email);
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = JsonTree::new();
        put_string(&mut tree, keys::ORGANIZATION, &self.organization);
        put_string(&mut tree, keys::PHONE, &self.phone);
        put_string(&mut tree, keys::EMAIL, &self.email);
        tree
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DisplaySettings {
    pub display_name: Option<String>,
    pub logo_uri: Option<String>,
    pub icon_uri: Option<String>,
    pub license: Option<String>,
}

impl Metadata for DisplaySettings {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        if let Some(name) = read_string(tree, keys::DISPLAY_NAME) {
            self.display_name = Some(name);
        }
        if let Some(uri) = read_string(tree, keys::LOGO_URI) {
            self.logo_uri = Some(uri);
        }
        if let Some(uri) = read_string(tree, keys::ICON_URI) {
            self.icon_uri = Some(uri);
        }
        if let Some(license) = read_string(tree, keys::LICENSE) {
            self.license = Some(license);
        }
        Ok(())
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        require_string(errors, keys::DISPLAY_NAME, &self.display_name);
        check_url(errors, keys::LOGO_URI, &self.logo_uri);
        check_url(errors, keys::ICON_URI, &self.icon_uri);
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = JsonTree::new();
        put_string(&mut tree, keys::DISPLAY_NAME, &self.display_name);
        put_string(&mut tree, keys::LOGO_URI, &self.logo_uri);
        put_string(&mut tree, keys::ICON_URI, &self.icon_uri);
        put_string(&mut tree, keys::LICENSE, &self.license);
        tree
    }
}

/// Profiles, schema grammars and signing algorithms a provider supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    pub authentication_profiles: Option<Vec<String>>,
    pub provisioning_profiles: Option<Vec<String>>,
    pub schema_grammars: Option<Vec<Recognized<SchemaGrammar>>>,
    /// JWS algorithm names in order of preference.
    pub signing_algorithms: Option<Vec<String>>,
}

impl Capabilities {
    /// Every declared profile URN, authentication first, in document order.
    pub fn declared_profiles(&self) -> impl Iterator<Item = &str> {
        self.authentication_profiles
            .iter()
            .chain(self.provisioning_profiles.iter())
            .flatten()
            .map(String::as_str)
    }

    pub fn signing_algorithms(&self) -> &[String] {
        self.signing_algorithms.as_deref().unwrap_or_default()
    }
}

impl Metadata for Capabilities {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        if let Some(urns) = read_string_list(tree, keys::AUTHENTICATION_PROFILES) {
            self.authentication_profiles = Some(urns);
        }
        if let Some(urns) = read_string_list(tree, keys::PROVISIONING_PROFILES) {
            self.provisioning_profiles = Some(urns);
        }
        if let Some(grammars) = read_string_list(tree, keys::SCHEMA_GRAMMARS) {
            self.schema_grammars = Some(
                grammars
                    .into_iter()
                    .map(|urn| match SchemaGrammar::from_urn(&urn) {
                        Some(grammar) => Recognized::Known(grammar),
                        None => Recognized::Unknown(urn),
                    })
                    .collect(),
            );
        }
        if let Some(algorithms) = read_string_list(tree, keys::SIGNING_ALGORITHMS) {
            self.signing_algorithms = Some(algorithms);
        }
        Ok(())
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        for grammar in self.schema_grammars.iter().flatten() {
            if let Recognized::Unknown(urn) = grammar {
                errors.add(keys::SCHEMA_GRAMMARS, FieldRule::Unrecognized(urn.clone()));
            }
        }

        if require(errors, keys::SIGNING_ALGORITHMS, &self.signing_algorithms) {
            let algorithms = self.signing_algorithms();
            if algorithms.is_empty() {
                errors.add(keys::SIGNING_ALGORITHMS, FieldRule::Empty);
            }
            for algorithm in algorithms {
                if !KNOWN_SIGNING_ALGORITHMS.contains(&algorithm.as_str()) {
                    errors.add(
                        keys::SIGNING_ALGORITHMS,
                        FieldRule::Unrecognized(algorithm.clone()),
                    );
                }
            }
        }
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = JsonTree::new();
        put_string_list(&mut tree, keys::AUTHENTICATION_PROFILES, &self.authentication_profiles);
        put_string_list(&mut tree, keys::PROVISIONING_PROFILES, &self.provisioning_profiles);
        let grammars = self.schema_grammars.as_ref().map(|grammars| {
            grammars
                .iter()
                .map(|grammar| match grammar {
                    Recognized::Known(grammar) => grammar.urn().to_string(),
                    Recognized::Unknown(urn) => urn.clone(),
                })
                .collect()
        });
        put_string_list(&mut tree, keys::SCHEMA_GRAMMARS, &grammars);
        put_string_list(&mut tree, keys::SIGNING_ALGORITHMS, &self.signing_algorithms);
        tree
    }
}
