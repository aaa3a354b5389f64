// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Profile Capability and Extension Maps
//!
//! A **profile** is an optional, URN-identified protocol extension (an
//! authentication or provisioning method). Each profile may attach fields to
//! up to four [`ExtensionPoint`]s and knows how to manufacture the extension
//! object for each point it supports.
//!
//! ## Design
//!
//! Profiles are capability objects behind `Arc<dyn Profile>`, stored in a
//! [`crate::domain::registry::ProfileRegistry`]. Providers never name concrete
//! profiles: they hold one [`ExtensionMap`] per extension point and let the
//! registry decide what to instantiate for each URN. New profiles are added by
//! implementing [`Profile`] and registering them; no provider or contract type
//! changes.
//!
//! Unknown URNs are a data case: the map keeps them and reports them from
//! `validate`, so they are never silently dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::config::FastFedConfiguration;
use crate::domain::errors::{ErrorAccumulator, FastFedError, FieldRule, Result};
use crate::domain::metadata::Metadata;
use crate::domain::tree::JsonTree;

/// The four places a profile may attach data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionPoint {
    ApplicationProviderMetadata,
    IdentityProviderMetadata,
    RegistrationRequest,
    RegistrationResponse,
}

impl ExtensionPoint {
    pub const ALL: [ExtensionPoint; 4] = [
        ExtensionPoint::ApplicationProviderMetadata,
        ExtensionPoint::IdentityProviderMetadata,
        ExtensionPoint::RegistrationRequest,
        ExtensionPoint::RegistrationResponse,
    ];
}

impl fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ApplicationProviderMetadata => "application provider metadata",
            Self::IdentityProviderMetadata => "identity provider metadata",
            Self::RegistrationRequest => "registration request",
            Self::RegistrationResponse => "registration response",
        };
        f.write_str(name)
    }
}

/// Whether a profile governs sign-in or user/group provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    Authentication,
    Provisioning,
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => f.write_str("authentication"),
            Self::Provisioning => f.write_str("provisioning"),
        }
    }
}

/// One optional protocol extension.
///
/// A `Profile` is immutable and shared read-only across every negotiation; it
/// holds no per-handshake state.
pub trait Profile: fmt::Debug + Send + Sync {
    /// The profile's URN, e.g. `urn:ietf:params:fastfed:1.0:provisioning:scim:2.0:enterprise`.
    fn urn(&self) -> &str;

    fn profile_type(&self) -> ProfileType;

    /// Whether this profile attaches data to `point`.
    fn supports(&self, point: ExtensionPoint) -> bool;

    /// Build a fresh, configuration-bound extension for `point`.
    ///
    /// Must return `None` when [`Profile::supports`] is false and `Some` when it
    /// is true; a supported point that yields `None` is reported as an internal
    /// inconsistency by the caller.
    fn make_extension(
        &self,
        point: ExtensionPoint,
        config: &FastFedConfiguration,
    ) -> Option<Box<dyn ProfileExtension>>;
}

/// The data a profile contributes at one extension point.
///
/// Extensions serialize flatly: the owning provider places their tree under the
/// profile URN.
pub trait ProfileExtension: Metadata + fmt::Debug + Send + Sync {
    fn profile_urn(&self) -> &str;

    fn extension_point(&self) -> ExtensionPoint;

    fn clone_extension(&self) -> Box<dyn ProfileExtension>;
}

impl Clone for Box<dyn ProfileExtension> {
    fn clone(&self) -> Self {
        self.clone_extension()
    }
}

impl PartialEq for dyn ProfileExtension {
    fn eq(&self, other: &Self) -> bool {
        self.profile_urn() == other.profile_urn()
            && self.extension_point() == other.extension_point()
            && self.to_tree() == other.to_tree()
    }
}

impl Eq for dyn ProfileExtension {}

/// A URN that did not resolve in the registry, with the field that named it.
///
/// `raw` keeps the sub-tree found under the URN key so it is written back out
/// and still fails validation after a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedProfile {
    pub field: String,
    pub urn: String,
    pub raw: Option<Value>,
}

/// URN-keyed set of extensions for one extension point of one provider.
///
/// Every declared URN that resolves in the registry gets an entry; the value is
/// `None` when the profile does not extend this point. Unresolved URNs are kept
/// aside and reported by [`ExtensionMap::validate`].
#[derive(Clone)]
pub struct ExtensionMap {
    point: ExtensionPoint,
    config: Arc<FastFedConfiguration>,
    entries: BTreeMap<String, Option<Box<dyn ProfileExtension>>>,
    unrecognized: Vec<UnrecognizedProfile>,
}

impl ExtensionMap {
    pub fn new(point: ExtensionPoint, config: Arc<FastFedConfiguration>) -> Self {
        Self {
            point,
            config,
            entries: BTreeMap::new(),
            unrecognized: Vec::new(),
        }
    }

    pub fn point(&self) -> ExtensionPoint {
        self.point
    }

    pub fn config(&self) -> &Arc<FastFedConfiguration> {
        &self.config
    }

    /// Resolve each URN and instantiate (or re-hydrate) its extension.
    ///
    /// `field` labels unresolved URNs in validation output; `None` labels them
    /// with the URN itself. When `tree` is given, each extension hydrates from
    /// `tree[urn]` (absent sub-trees leave the extension at its defaults).
    ///
    /// # Errors
    ///
    /// [`FastFedError::Internal`] if a profile supports this point but
    /// manufactures no extension.
    pub fn hydrate_profiles<'a, I>(
        &mut self,
        field: Option<&str>,
        urns: I,
        tree: Option<&JsonTree>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for urn in urns {
            let Some(profile) = self.config.registry().resolve(urn) else {
                let raw = tree.and_then(|tree| tree.get(urn)).cloned();
                match self.unrecognized.iter_mut().find(|u| u.urn == urn) {
                    Some(existing) => {
                        if raw.is_some() {
                            existing.raw = raw;
                        }
                    }
                    None => {
                        warn!(urn = %urn, point = %self.point, "Unrecognized profile URN in metadata");
                        self.unrecognized.push(UnrecognizedProfile {
                            field: field.unwrap_or(urn).to_string(),
                            urn: urn.to_string(),
                            raw,
                        });
                    }
                }
                continue;
            };

            let slot = self.entries.entry(urn.to_string()).or_insert(None);
            if !profile.supports(self.point) {
                continue;
            }

            if slot.is_none() {
                let extension = profile
                    .make_extension(self.point, &self.config)
                    .ok_or_else(|| {
                        FastFedError::Internal(format!(
                            "profile '{}' supports the {} extension point but produced no extension",
                            urn, self.point
                        ))
                    })?;
                debug!(urn = %urn, point = %self.point, "Instantiated profile extension");
                *slot = Some(extension);
            }

            if let (Some(extension), Some(tree)) = (slot.as_mut(), tree) {
                extension.hydrate(tree.get(urn).unwrap_or(&Value::Null))?;
            }
        }
        Ok(())
    }

    /// Declare support for `urn` without hydrating any data.
    pub fn declare(&mut self, urn: &str) -> Result<()> {
        self.hydrate_profiles(None, [urn], None)
    }

    /// Replace the extension stored for its profile URN.
    ///
    /// # Errors
    ///
    /// [`FastFedError::Internal`] if the extension belongs to another extension
    /// point or its profile is not installed in the registry.
    pub fn insert(&mut self, extension: Box<dyn ProfileExtension>) -> Result<()> {
        if extension.extension_point() != self.point {
            return Err(FastFedError::Internal(format!(
                "cannot store a {} extension in a {} map",
                extension.extension_point(),
                self.point
            )));
        }
        let urn = extension.profile_urn().to_string();
        if !self.config.registry().contains(&urn) {
            return Err(FastFedError::Internal(format!(
                "profile '{urn}' is not installed in the registry"
            )));
        }
        self.entries.insert(urn, Some(extension));
        Ok(())
    }

    /// Whether `urn` is declared (and recognized) on this side.
    pub fn contains(&self, urn: &str) -> bool {
        self.entries.contains_key(urn)
    }

    pub fn get(&self, urn: &str) -> Option<&dyn ProfileExtension> {
        self.entries.get(urn).and_then(|slot| slot.as_deref())
    }

    pub fn get_mut(&mut self, urn: &str) -> Option<&mut Box<dyn ProfileExtension>> {
        self.entries.get_mut(urn).and_then(|slot| slot.as_mut())
    }

    /// Declared, recognized URNs in sorted order.
    pub fn urns(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn unrecognized(&self) -> &[UnrecognizedProfile] {
        &self.unrecognized
    }

    /// True when no URN was declared, recognized or not.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unrecognized.is_empty()
    }

    /// Whether any entry carries extension data.
    pub fn has_extensions(&self) -> bool {
        self.entries.values().any(Option::is_some)
    }

    /// Report unrecognized URNs, then validate each extension under its URN.
    pub fn validate(&self, errors: &mut ErrorAccumulator) {
        for unrecognized in &self.unrecognized {
            errors.add(
                &unrecognized.field,
                FieldRule::UnrecognizedProfile(unrecognized.urn.clone()),
            );
        }
        for (urn, extension) in &self.entries {
            if let Some(extension) = extension {
                errors.scope(urn, |errors| extension.validate(errors));
            }
        }
    }

    /// Write each extension's tree under its URN into `tree`, along with the
    /// retained sub-trees of unrecognized URNs.
    pub fn write_into(&self, tree: &mut JsonTree) {
        for (urn, extension) in &self.entries {
            if let Some(extension) = extension {
                tree.insert(urn.clone(), Value::Object(extension.to_tree()));
            }
        }
        for unrecognized in &self.unrecognized {
            if let Some(raw) = &unrecognized.raw {
                tree.insert(unrecognized.urn.clone(), raw.clone());
            }
        }
    }

    pub fn to_tree(&self) -> JsonTree {
        let mut tree = JsonTree::new();
        self.write_into(&mut tree);
        tree
    }
}

impl PartialEq for ExtensionMap {
    fn eq(&self, other: &Self) -> bool {
        self.point == other.point
            && self.entries == other.entries
            && self.unrecognized == other.unrecognized
    }
}

impl Eq for ExtensionMap {}

impl fmt::Debug for ExtensionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionMap")
            .field("point", &self.point)
            .field("entries", &self.entries)
            .field("unrecognized", &self.unrecognized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::FastFedConfiguration;
    use crate::domain::profiles::enterprise_saml::ENTERPRISE_SAML_URN;
    use crate::domain::profiles::enterprise_scim::ENTERPRISE_SCIM_URN;
    use serde_json::json;

    fn config() -> Arc<FastFedConfiguration> {
        FastFedConfiguration::builder().build().unwrap()
    }

    #[test]
    fn test_declared_profiles_get_entries() {
        let mut map = ExtensionMap::new(ExtensionPoint::ApplicationProviderMetadata, config());
        map.hydrate_profiles(None, [ENTERPRISE_SCIM_URN, ENTERPRISE_SAML_URN], None)
            .unwrap();
        assert!(map.contains(ENTERPRISE_SCIM_URN));
        assert!(map.contains(ENTERPRISE_SAML_URN));
        assert!(map.get(ENTERPRISE_SCIM_URN).is_some());
        assert_eq!(map.urns().count(), 2);
    }

    #[test]
    fn test_unsupported_point_keeps_empty_entry() {
        let mut map = ExtensionMap::new(ExtensionPoint::IdentityProviderMetadata, config());
        map.declare(ENTERPRISE_SCIM_URN).unwrap();
        assert!(map.contains(ENTERPRISE_SCIM_URN));
        assert!(map.get(ENTERPRISE_SCIM_URN).is_none());
        assert!(!map.has_extensions());
        assert!(map.to_tree().is_empty());
    }

    #[test]
    fn test_unknown_urn_is_reported_not_dropped() {
        let mut map = ExtensionMap::new(ExtensionPoint::ApplicationProviderMetadata, config());
        map.hydrate_profiles(
            Some("capabilities.provisioning_profiles"),
            ["urn:example:unknown", "urn:example:unknown"],
            None,
        )
        .unwrap();
        assert!(!map.contains("urn:example:unknown"));
        assert_eq!(map.unrecognized().len(), 1);

        let mut errors = ErrorAccumulator::new();
        map.validate(&mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].field, "capabilities.provisioning_profiles");
        assert!(errors.errors()[0].to_string().contains("urn:example:unknown"));
    }

    #[test]
    fn test_unknown_urn_sub_tree_is_written_back() {
        let tree = json!({"urn:example:unknown": {"x": 1}});
        let mut map = ExtensionMap::new(ExtensionPoint::IdentityProviderMetadata, config());
        map.hydrate_profiles(None, ["urn:example:unknown"], tree.as_object())
            .unwrap();
        assert_eq!(Value::Object(map.to_tree()), tree);

        let mut rehydrated = ExtensionMap::new(ExtensionPoint::IdentityProviderMetadata, config());
        rehydrated
            .hydrate_profiles(None, ["urn:example:unknown"], Some(&map.to_tree()))
            .unwrap();
        assert_eq!(rehydrated, map);
        let mut errors = ErrorAccumulator::new();
        rehydrated.validate(&mut errors);
        assert_eq!(errors.errors()[0].field, "urn:example:unknown");
    }

    #[test]
    fn test_extension_hydrates_from_urn_key() {
        let tree = json!({
            ENTERPRISE_SAML_URN: {"saml_metadata_uri": "https://idp.example.com/saml"}
        });
        let mut map = ExtensionMap::new(ExtensionPoint::RegistrationRequest, config());
        map.hydrate_profiles(None, [ENTERPRISE_SAML_URN], tree.as_object())
            .unwrap();
        assert_eq!(
            Value::Object(map.to_tree()),
            tree,
        );
    }

    #[test]
    fn test_insert_rejects_foreign_extension_point() {
        let cfg = config();
        let profile = cfg.registry().resolve(ENTERPRISE_SAML_URN).unwrap();
        let extension = profile
            .make_extension(ExtensionPoint::RegistrationResponse, &cfg)
            .unwrap();
        let mut map = ExtensionMap::new(ExtensionPoint::RegistrationRequest, cfg.clone());
        assert!(matches!(map.insert(extension), Err(FastFedError::Internal(_))));
    }

    #[derive(Debug)]
    struct BrokenProfile;

    impl Profile for BrokenProfile {
        fn urn(&self) -> &str {
            "urn:example:broken"
        }

        fn profile_type(&self) -> ProfileType {
            ProfileType::Authentication
        }

        fn supports(&self, _point: ExtensionPoint) -> bool {
            true
        }

        fn make_extension(
            &self,
            _point: ExtensionPoint,
            _config: &FastFedConfiguration,
        ) -> Option<Box<dyn ProfileExtension>> {
            None
        }
    }

    #[test]
    fn test_supported_point_without_extension_is_internal_defect() {
        let cfg = FastFedConfiguration::builder()
            .with_profile(Arc::new(BrokenProfile))
            .build()
            .unwrap();
        let mut map = ExtensionMap::new(ExtensionPoint::RegistrationRequest, cfg);
        let result = map.declare("urn:example:broken");
        assert!(matches!(result, Err(FastFedError::Internal(_))));
    }
}
