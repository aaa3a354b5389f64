// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Error Taxonomy and Error Accumulator
//!
//! Validation in this crate is **collect-all, not fail-fast**: every
//! [`crate::domain::metadata::Metadata::validate`] call appends to an
//! [`ErrorAccumulator`] and keeps going. Only after a full pass does the caller
//! decide whether to surface a single [`FastFedError::MalformedMetadata`]
//! carrying the complete list.
//!
//! | Variant | Raised when | Accumulated? |
//! |---------|-------------|--------------|
//! | `MalformedMetadata` | a validation pass recorded at least one [`FieldError`] | yes |
//! | `IncompatibleProviders` | two individually valid providers cannot federate | no |
//! | `InvalidChange` | a lifecycle transition is illegal (e.g. terminal proposal) | no |
//! | `Security` | a protocol security requirement is violated | no |
//! | `Internal` | a profile claims support but manufactures no extension | no |

use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::domain::profile::ProfileType;
use crate::domain::provider::ProviderSide;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FastFedError>;

/// The rule a single field violated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldRule {
    /// A required field is absent.
    Required,
    /// A required list is present but empty.
    Empty,
    /// The value is not a well-formed URL.
    InvalidUrl(String),
    /// The value is not a member of the field's enumeration.
    Unrecognized(String),
    /// The profile URN is not installed in the active registry.
    UnrecognizedProfile(String),
    /// The profile URN is listed under the wrong profile type.
    ProfileTypeMismatch { urn: String, expected: ProfileType },
    /// A numeric value lies outside its allowed range.
    OutOfRange { value: u64, min: u64, max: u64 },
    /// An enabled profile is missing from one side of a contract.
    NotMutuallySupported { urn: String, side: ProviderSide },
    /// The URN is enabled as both an authentication and a provisioning profile.
    Conflicting(String),
    /// The signing algorithm is on the configured disallowed list.
    DisallowedAlgorithm(String),
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `display_settings.display_name`.
    pub field: String,
    pub rule: FieldRule,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = &self.field;
        match &self.rule {
            FieldRule::Required => write!(f, "{field}: required field is missing"),
            FieldRule::Empty => write!(f, "{field}: must not be empty"),
            FieldRule::InvalidUrl(value) => {
                write!(f, "{field}: '{value}' is not a well-formed URL")
            }
            FieldRule::Unrecognized(value) => {
                write!(f, "{field}: '{value}' is not a recognized value")
            }
            FieldRule::UnrecognizedProfile(urn) => {
                write!(f, "{field}: unrecognized profile URN '{urn}'")
            }
            FieldRule::ProfileTypeMismatch { urn, expected } => {
                write!(f, "{field}: profile '{urn}' is not a {expected} profile")
            }
            FieldRule::OutOfRange { value, min, max } => {
                write!(f, "{field}: {value} is outside the allowed range [{min}, {max}]")
            }
            FieldRule::NotMutuallySupported { urn, side } => {
                write!(f, "{field}: profile '{urn}' is not supported by the {side}")
            }
            FieldRule::DisallowedAlgorithm(algorithm) => {
                write!(f, "{field}: signing algorithm '{algorithm}' is not permitted")
            }
            FieldRule::Conflicting(urn) => write!(
                f,
                "{field}: profile '{urn}' is enabled as both authentication and provisioning"
            ),
        }
    }
}

/// Collects every validation failure of a pass instead of stopping at the first.
///
/// Nested objects are validated inside a [`ErrorAccumulator::scope`], which
/// prefixes the field names they report with the parent key.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorAccumulator {
    errors: Vec<FieldError>,
    scope: Vec<String>,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation of `rule` by `field` (relative to the current scope).
    pub fn add(&mut self, field: &str, rule: FieldRule) {
        let field = if self.scope.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.scope.join("."), field)
        };
        self.errors.push(FieldError { field, rule });
    }

    /// Run `validate` with `name` pushed onto the field path.
    pub fn scope<F>(&mut self, name: &str, validate: F)
    where
        F: FnOnce(&mut ErrorAccumulator),
    {
        self.scope.push(name.to_string());
        validate(self);
        self.scope.pop();
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Consume the accumulator, returning `Ok` when nothing was recorded and a
    /// single aggregated [`FastFedError::MalformedMetadata`] otherwise.
    pub fn into_result(self, tree: Option<Value>) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(FastFedError::MalformedMetadata {
                errors: self.errors,
                tree: tree.map(Box::new),
            })
        }
    }
}

/// Why two providers cannot federate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incompatibility {
    /// A requested profile is absent from one side's extension map.
    MissingProfile { urn: String, missing_from: ProviderSide },
    /// The signing-algorithm policy produced an empty agreement.
    NoCommonSigningAlgorithm {
        identity_provider: Vec<String>,
        application_provider: Vec<String>,
    },
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProfile { urn, missing_from } => {
                write!(f, "profile '{urn}' is not supported by the {missing_from}")
            }
            Self::NoCommonSigningAlgorithm {
                identity_provider,
                application_provider,
            } => write!(
                f,
                "no common signing algorithm (identity provider: [{}], application provider: [{}])",
                identity_provider.join(", "),
                application_provider.join(", ")
            ),
        }
    }
}

/// Errors raised by the FastFed metadata model and negotiation engine.
#[derive(Debug, Error)]
pub enum FastFedError {
    #[error("Malformed metadata ({} error(s)): {}", .errors.len(), join_errors(.errors))]
    MalformedMetadata {
        errors: Vec<FieldError>,
        /// The offending raw tree, when the caller had one at hand.
        tree: Option<Box<Value>>,
    },

    #[error("Incompatible providers: {0}")]
    IncompatibleProviders(Incompatibility),

    #[error("Invalid change: {0}")]
    InvalidChange(String),

    #[error("Security violation: {0}")]
    Security(String),

    #[error("Internal inconsistency: {0}")]
    Internal(String),
}

impl FastFedError {
    /// Field-level errors carried by a `MalformedMetadata` failure; empty otherwise.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::MalformedMetadata { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_collects_without_stopping() {
        let mut errors = ErrorAccumulator::new();
        errors.add("entity_id", FieldRule::Required);
        errors.add("jwks_uri", FieldRule::InvalidUrl("nope".to_string()));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.errors()[0].field, "entity_id");
        assert_eq!(errors.errors()[1].field, "jwks_uri");
    }

    #[test]
    fn test_scope_prefixes_nested_fields() {
        let mut errors = ErrorAccumulator::new();
        errors.scope("display_settings", |errors| {
            errors.add("display_name", FieldRule::Required);
            errors.scope("inner", |errors| errors.add("leaf", FieldRule::Empty));
        });
        errors.add("top", FieldRule::Required);

        let fields: Vec<&str> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["display_settings.display_name", "display_settings.inner.leaf", "top"]
        );
    }

    #[test]
    fn test_into_result_aggregates_everything() {
        let mut errors = ErrorAccumulator::new();
        assert!(errors.clone().into_result(None).is_ok());

        errors.add("a", FieldRule::Required);
        errors.add("b", FieldRule::Unrecognized("x".to_string()));
        let err = errors.into_result(Some(serde_json::json!({"a": null}))).unwrap_err();
        assert_eq!(err.field_errors().len(), 2);
        match err {
            FastFedError::MalformedMetadata { tree, .. } => assert!(tree.is_some()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_display_names_field_and_rule() {
        let err = FieldError {
            field: "capabilities.authentication_profiles".to_string(),
            rule: FieldRule::UnrecognizedProfile("urn:example:unknown".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("capabilities.authentication_profiles"));
        assert!(message.contains("urn:example:unknown"));

        let range = FieldError {
            field: "max_group_membership_changes".to_string(),
            rule: FieldRule::OutOfRange { value: 5, min: 100, max: 1000 },
        };
        assert!(range.to_string().contains("[100, 1000]"));
    }

    #[test]
    fn test_incompatibility_display_names_side() {
        let err = FastFedError::IncompatibleProviders(Incompatibility::MissingProfile {
            urn: "urn:x".to_string(),
            missing_from: ProviderSide::ApplicationProvider,
        });
        let message = err.to_string();
        assert!(message.contains("urn:x"));
        assert!(message.contains("application provider"));
    }
}
