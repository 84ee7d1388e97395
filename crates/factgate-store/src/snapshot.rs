//! Snapshot tree and its visitor
//!
//! The upstream data snapshot is an arbitrarily nested tree. It is converted once
//! into [`SnapshotValue`] and then walked depth-first; every level is visited and
//! every leaf is reported together with its dotted path.

use std::collections::BTreeMap;

/// A node of the upstream data snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotValue {
    /// Explicit null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Any JSON number
    Number(f64),
    /// Text
    String(String),
    /// Ordered list
    Sequence(Vec<SnapshotValue>),
    /// Keyed mapping, keys sorted
    Mapping(BTreeMap<String, SnapshotValue>),
}

impl SnapshotValue {
    /// Numeric value, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SnapshotValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String slice, if this is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SnapshotValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Mapping, if this is one
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, SnapshotValue>> {
        match self {
            SnapshotValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Child of a mapping by key
    pub fn get(&self, key: &str) -> Option<&SnapshotValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }
}

impl From<serde_json::Value> for SnapshotValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => SnapshotValue::Null,
            Value::Bool(b) => SnapshotValue::Bool(b),
            // Numbers outside f64 range do not occur in market data
            Value::Number(n) => n.as_f64().map_or(SnapshotValue::Null, SnapshotValue::Number),
            Value::String(s) => SnapshotValue::String(s),
            Value::Array(items) => {
                SnapshotValue::Sequence(items.into_iter().map(SnapshotValue::from).collect())
            }
            Value::Object(map) => SnapshotValue::Mapping(
                map.into_iter().map(|(k, v)| (k, SnapshotValue::from(v))).collect(),
            ),
        }
    }
}

/// Callbacks invoked while walking a snapshot
pub trait SnapshotVisitor {
    /// Called for every scalar leaf (`Null`, `Bool`, `Number`, `String`)
    ///
    /// `key` is the nearest mapping key above the leaf, if any.
    fn visit_leaf(&mut self, path: &str, key: Option<&str>, value: &SnapshotValue);

    /// Called before descending into a mapping
    fn enter_mapping(
        &mut self,
        _path: &str,
        _key: Option<&str>,
        _mapping: &BTreeMap<String, SnapshotValue>,
    ) {
    }
}

/// Walk a snapshot depth-first, keys in sorted order
pub fn walk<V: SnapshotVisitor>(root: &SnapshotValue, visitor: &mut V) {
    walk_node(root, String::new(), None, visitor);
}

fn walk_node<V: SnapshotVisitor>(
    node: &SnapshotValue,
    path: String,
    key: Option<&str>,
    visitor: &mut V,
) {
    match node {
        SnapshotValue::Mapping(map) => {
            visitor.enter_mapping(&path, key, map);
            for (child_key, child) in map {
                let child_path = if path.is_empty() {
                    child_key.clone()
                } else {
                    format!("{path}.{child_key}")
                };
                walk_node(child, child_path, Some(child_key), visitor);
            }
        }
        SnapshotValue::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                // Elements of a list inherit the list's key
                walk_node(item, format!("{path}[{i}]"), key, visitor);
            }
        }
        leaf => visitor.visit_leaf(&path, key, leaf),
    }
}
