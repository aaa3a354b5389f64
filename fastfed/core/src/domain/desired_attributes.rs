// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Desired Attributes - user/group attributes an application provider asks for
//
// Wire shape, keyed by schema grammar:
//
//   "desired_attributes": {
//     "urn:ietf:params:fastfed:1.0:schemas:scim:2.0": {
//       "required_user_attributes": [...],
//       "optional_user_attributes": [...],
//       "required_group_attributes": [...],
//       "optional_group_attributes": [...]
//     }
//   }
//
// Only the configured preferred grammar is read and written; other grammars in
// the tree are ignored.

use serde_json::Value;

use crate::domain::config::SchemaGrammar;
use crate::domain::errors::{ErrorAccumulator, FieldRule, Result};
use crate::domain::keys;
use crate::domain::metadata::require;
use crate::domain::metadata::Metadata;
use crate::domain::tree::{as_tree, put_string_list, read_string_list, read_tree, JsonTree};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DesiredAttributes {
    grammar: SchemaGrammar,
    pub required_user_attributes: Option<Vec<String>>,
    pub optional_user_attributes: Option<Vec<String>>,
    pub required_group_attributes: Option<Vec<String>>,
    pub optional_group_attributes: Option<Vec<String>>,
}

impl DesiredAttributes {
    pub fn new(grammar: SchemaGrammar) -> Self {
        Self {
            grammar,
            required_user_attributes: None,
            optional_user_attributes: None,
            required_group_attributes: None,
            optional_group_attributes: None,
        }
    }

    pub fn grammar(&self) -> SchemaGrammar {
        self.grammar
    }

    /// Attributes requested at all, required first.
    pub fn user_attributes(&self) -> impl Iterator<Item = &str> {
        self.required_user_attributes
            .iter()
            .chain(self.optional_user_attributes.iter())
            .flatten()
            .map(String::as_str)
    }
}

impl Metadata for DesiredAttributes {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        let Some(grammar_tree) = as_tree(tree).and_then(|tree| read_tree(tree, self.grammar.urn()))
        else {
            return Ok(());
        };

        if let Some(attributes) = read_string_list(grammar_tree, keys::REQUIRED_USER_ATTRIBUTES) {
            self.required_user_attributes = Some(attributes);
        }
        if let Some(attributes) = read_string_list(grammar_tree, keys::OPTIONAL_USER_ATTRIBUTES) {
            self.optional_user_attributes = Some(attributes);
        }
        if let Some(attributes) = read_string_list(grammar_tree, keys::REQUIRED_GROUP_ATTRIBUTES) {
            self.required_group_attributes = Some(attributes);
        }
        if let Some(attributes) = read_string_list(grammar_tree, keys::OPTIONAL_GROUP_ATTRIBUTES) {
            self.optional_group_attributes = Some(attributes);
        }
        Ok(())
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        errors.scope(self.grammar.urn(), |errors| {
            if require(errors, keys::REQUIRED_USER_ATTRIBUTES, &self.required_user_attributes)
                && self
                    .required_user_attributes
                    .as_ref()
                    .is_some_and(Vec::is_empty)
            {
                errors.add(keys::REQUIRED_USER_ATTRIBUTES, FieldRule::Empty);
            }
        });
    }

    fn to_tree(&self) -> JsonTree {
        let mut grammar_tree = JsonTree::new();
        put_string_list(
            &mut grammar_tree,
            keys::REQUIRED_USER_ATTRIBUTES,
            &self.required_user_attributes,
        );
        put_string_list(
            &mut grammar_tree,
            keys::OPTIONAL_USER_ATTRIBUTES,
            &self.optional_user_attributes,
        );
        put_string_list(
            &mut grammar_tree,
            keys::REQUIRED_GROUP_ATTRIBUTES,
            &self.required_group_attributes,
        );
        put_string_list(
            &mut grammar_tree,
            keys::OPTIONAL_GROUP_ATTRIBUTES,
            &self.optional_group_attributes,
        );

        let mut tree = JsonTree::new();
        tree.insert(self.grammar.urn().to_string(), Value::Object(grammar_tree));
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scim_tree() -> Value {
        json!({
            "urn:ietf:params:fastfed:1.0:schemas:scim:2.0": {
                "required_user_attributes": ["externalId", "userName"],
                "optional_user_attributes": ["displayName"],
                "required_group_attributes": ["displayName"]
            }
        })
    }

    #[test]
    fn test_hydrate_reads_preferred_grammar() {
        let mut attributes = DesiredAttributes::new(SchemaGrammar::Scim2);
        attributes.hydrate(&scim_tree()).unwrap();
        assert_eq!(
            attributes.user_attributes().collect::<Vec<_>>(),
            vec!["externalId", "userName", "displayName"]
        );
        assert_eq!(attributes.optional_group_attributes, None);
        assert_eq!(Value::Object(attributes.to_tree()), scim_tree());
    }

    #[test]
    fn test_missing_required_user_attributes_reported_under_grammar() {
        let attributes = DesiredAttributes::new(SchemaGrammar::Scim2);
        let mut errors = ErrorAccumulator::new();
        attributes.validate(&mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.errors()[0].field,
            "urn:ietf:params:fastfed:1.0:schemas:scim:2.0.required_user_attributes"
        );
    }

    #[test]
    fn test_empty_required_user_attributes_rejected() {
        let mut attributes = DesiredAttributes::new(SchemaGrammar::Scim2);
        attributes.required_user_attributes = Some(vec![]);
        let mut errors = ErrorAccumulator::new();
        attributes.validate(&mut errors);
        assert_eq!(errors.errors()[0].rule, FieldRule::Empty);
    }

    #[test]
    fn test_hydrate_null_is_noop() {
        let mut attributes = DesiredAttributes::new(SchemaGrammar::Scim2);
        attributes.hydrate(&Value::Null).unwrap();
        assert_eq!(attributes, DesiredAttributes::new(SchemaGrammar::Scim2));
    }
}
