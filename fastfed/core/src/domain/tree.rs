// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Generic Metadata Tree
//!
//! Every FastFed document travels as an untyped JSON tree. Hydration reads from
//! a [`JsonTree`] and serialization writes one back; the helpers here keep that
//! code uniform across the model.
//!
//! Readers are tolerant: a value of the wrong JSON type is reported as absent,
//! which leaves the target field at its default and lets `validate` describe the
//! problem instead of hydration failing mid-pass.

use serde_json::{Map, Value};
use std::hash::{Hash, Hasher};

/// A JSON object, the unit every metadata object hydrates from and serializes to.
pub type JsonTree = Map<String, Value>;

/// Borrow `value` as an object, or `None` for `null` and every non-object value.
pub fn as_tree(value: &Value) -> Option<&JsonTree> {
    value.as_object()
}

pub fn read_string(tree: &JsonTree, key: &str) -> Option<String> {
    tree.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn read_bool(tree: &JsonTree, key: &str) -> Option<bool> {
    tree.get(key).and_then(Value::as_bool)
}

pub fn read_u64(tree: &JsonTree, key: &str) -> Option<u64> {
    tree.get(key).and_then(Value::as_u64)
}

pub fn read_i64(tree: &JsonTree, key: &str) -> Option<i64> {
    tree.get(key).and_then(Value::as_i64)
}

/// Read an array of strings. Non-string entries are skipped; a non-array value is absent.
pub fn read_string_list(tree: &JsonTree, key: &str) -> Option<Vec<String>> {
    tree.get(key).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

pub fn read_tree<'a>(tree: &'a JsonTree, key: &str) -> Option<&'a JsonTree> {
    tree.get(key).and_then(Value::as_object)
}

/// Keys of `tree` that name a profile (`urn:` prefixed), in map order.
pub fn urn_keys(tree: &JsonTree) -> impl Iterator<Item = &str> {
    tree.keys()
        .map(String::as_str)
        .filter(|key| key.starts_with("urn:"))
}

pub fn put_string(tree: &mut JsonTree, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        tree.insert(key.to_string(), Value::String(value.clone()));
    }
}

pub fn put_bool(tree: &mut JsonTree, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        tree.insert(key.to_string(), Value::Bool(value));
    }
}

pub fn put_u64(tree: &mut JsonTree, key: &str, value: Option<u64>) {
    if let Some(value) = value {
        tree.insert(key.to_string(), Value::from(value));
    }
}

pub fn put_string_list(tree: &mut JsonTree, key: &str, value: &Option<Vec<String>>) {
    if let Some(items) = value {
        tree.insert(
            key.to_string(),
            Value::Array(items.iter().cloned().map(Value::String).collect()),
        );
    }
}

pub fn put_tree(tree: &mut JsonTree, key: &str, value: Option<JsonTree>) {
    if let Some(value) = value {
        tree.insert(key.to_string(), Value::Object(value));
    }
}

/// Feed the canonical serialized form of `tree` into `state`.
///
/// Composite metadata objects hash through their serialized tree so that
/// `Hash` agrees with their structural `PartialEq`.
pub fn hash_tree<H: Hasher>(tree: &JsonTree, state: &mut H) {
    Value::Object(tree.clone()).to_string().hash(state);
}
