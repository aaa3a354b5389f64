// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Metadata Contract
//!
//! Every structured object in the FastFed model (providers, contracts,
//! proposals, profile extensions) implements [`Metadata`]:
//!
//! ```text
//! raw tree ──hydrate──▶ typed object ──validate──▶ ErrorAccumulator
//!                             │
//!                             └──to_tree──▶ raw tree
//! ```
//!
//! ## Contract
//!
//! - `hydrate` reads each declared field; absent keys leave the field at its
//!   default. Hydrating a non-object tree (`null`, absent) is a no-op. Nested
//!   objects are hydrated only when their sub-tree is present.
//! - `validate` checks fields in declaration order, records every violation and
//!   never stops early. Present nested objects delegate to their own `validate`
//!   inside a scope named after their key.
//! - `to_tree` emits only non-absent fields. Nested objects are placed under
//!   their own key by the parent; profile extensions emit their fields flatly and
//!   the owning provider places them under the profile URN.

use serde_json::Value;

use crate::domain::errors::{ErrorAccumulator, FieldRule, Result};
use crate::domain::tree::JsonTree;

/// Hydrate / validate / serialize contract shared by every metadata object.
pub trait Metadata {
    /// Populate fields from `tree`, recursing into present nested objects.
    ///
    /// # Errors
    ///
    /// Only [`crate::domain::errors::FastFedError::Internal`], when an installed
    /// profile claims to extend a point but manufactures no extension. Data
    /// problems never fail hydration; they surface from [`Metadata::validate`].
    fn hydrate(&mut self, tree: &Value) -> Result<()>;

    /// Record every violated rule into `errors`.
    fn validate(&self, errors: &mut ErrorAccumulator);

    /// Serialize the non-absent fields into a fresh tree.
    fn to_tree(&self) -> JsonTree;

    /// Run a full validation pass and aggregate the outcome.
    ///
    /// Returns a single `MalformedMetadata` carrying every accumulated error, or
    /// `Ok(())` if the object is valid.
    fn check(&self) -> Result<()> {
        let mut errors = ErrorAccumulator::new();
        self.validate(&mut errors);
        errors.into_result(None)
    }
}

/// A wire value that is either a member of `T` or an unrecognized string kept
/// verbatim so it can round-trip and be reported by `validate`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Recognized<T> {
    Known(T),
    Unknown(String),
}

impl<T> Recognized<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unknown(_) => None,
        }
    }
}

/// Record `Required` when `value` is absent. Returns whether it was present.
pub fn require<T>(errors: &mut ErrorAccumulator, field: &str, value: &Option<T>) -> bool {
    if value.is_none() {
        errors.add(field, FieldRule::Required);
        return false;
    }
    true
}

/// Required, non-blank string.
pub fn require_string(errors: &mut ErrorAccumulator, field: &str, value: &Option<String>) {
    match value {
        None => errors.add(field, FieldRule::Required),
        Some(value) if value.trim().is_empty() => errors.add(field, FieldRule::Empty),
        Some(_) => {}
    }
}

/// Required, well-formed URL.
pub fn require_url(errors: &mut ErrorAccumulator, field: &str, value: &Option<String>) {
    if require(errors, field, value) {
        check_url(errors, field, value);
    }
}

/// Optional URL: checked only when present.
pub fn check_url(errors: &mut ErrorAccumulator, field: &str, value: &Option<String>) {
    if let Some(value) = value {
        if url::Url::parse(value).is_err() {
            errors.add(field, FieldRule::InvalidUrl(value.clone()));
        }
    }
}

/// Required nested object: `Required` when absent, delegated validation otherwise.
pub fn require_nested<M: Metadata>(errors: &mut ErrorAccumulator, field: &str, value: &Option<M>) {
    match value {
        None => errors.add(field, FieldRule::Required),
        Some(nested) => errors.scope(field, |errors| nested.validate(errors)),
    }
}

/// Hydrate a nested object only when its sub-tree is present.
///
/// An existing value is hydrated in place; otherwise `make` builds a fresh one.
pub fn hydrate_nested<M, F>(tree: &JsonTree, key: &str, slot: &mut Option<M>, make: F) -> Result<()>
where
    M: Metadata,
    F: FnOnce() -> M,
{
    if let Some(sub_tree) = tree.get(key).filter(|value| value.is_object()) {
        let nested = slot.get_or_insert_with(make);
        nested.hydrate(sub_tree)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tree::{read_string, put_string};
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Leaf {
        name: Option<String>,
    }

    impl Metadata for Leaf {
        fn hydrate(&mut self, tree: &Value) -> Result<()> {
            let Some(tree) = tree.as_object() else {
                return Ok(());
            };
            if let Some(name) = read_string(tree, "name") {
                self.name = Some(name);
            }
            Ok(())
        }

        fn validate(&self, errors: &mut ErrorAccumulator) {
            require_string(errors, "name", &self.name);
        }

        fn to_tree(&self) -> JsonTree {
            let mut tree = JsonTree::new();
            put_string(&mut tree, "name", &self.name);
            tree
        }
    }

    #[test]
    fn test_hydrate_nested_skips_absent_sub_tree() {
        let tree = json!({"other": {}}).as_object().cloned().unwrap();
        let mut slot: Option<Leaf> = None;
        hydrate_nested(&tree, "leaf", &mut slot, Leaf::default).unwrap();
        assert!(slot.is_none());

        let tree = json!({"leaf": {"name": "x"}}).as_object().cloned().unwrap();
        hydrate_nested(&tree, "leaf", &mut slot, Leaf::default).unwrap();
        assert_eq!(slot.unwrap().name.as_deref(), Some("x"));
    }

    #[test]
    fn test_require_nested_scopes_errors() {
        let mut errors = ErrorAccumulator::new();
        require_nested(&mut errors, "leaf", &Some(Leaf::default()));
        require_nested::<Leaf>(&mut errors, "missing", &None);
        assert_eq!(errors.errors()[0].field, "leaf.name");
        assert_eq!(errors.errors()[1].field, "missing");
        assert_eq!(errors.errors()[1].rule, FieldRule::Required);
    }

    #[test]
    fn test_url_rules() {
        let mut errors = ErrorAccumulator::new();
        require_url(&mut errors, "a", &None);
        require_url(&mut errors, "b", &Some("not a url".to_string()));
        require_url(&mut errors, "c", &Some("https://idp.example.com/jwks".to_string()));
        check_url(&mut errors, "d", &None);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.errors()[0].rule, FieldRule::Required);
        assert_eq!(
            errors.errors()[1].rule,
            FieldRule::InvalidUrl("not a url".to_string())
        );
    }

    #[test]
    fn test_check_aggregates_failures() {
        let leaf = Leaf::default();
        let err = leaf.check().unwrap_err();
        assert_eq!(err.field_errors().len(), 1);

        let leaf = Leaf { name: Some("ok".to_string()) };
        assert!(leaf.check().is_ok());
    }

    #[test]
    fn test_blank_string_is_reported_as_empty() {
        let mut errors = ErrorAccumulator::new();
        require_string(&mut errors, "name", &Some("  ".to_string()));
        assert_eq!(errors.errors()[0].rule, FieldRule::Empty);
    }
}
