//! CI/CD variable collections.
//!
//! A collection is an ordered sequence of variables in which keys may
//! repeat; lookups resolve to the most recently declared entry, while the
//! full sequence (duplicates included) is preserved for dispatch to the
//! runner.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single CI/CD variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    pub value: String,
    /// Exposed to forked pipelines and visible in job logs.
    pub public: bool,
    /// Value is scrubbed from job logs.
    pub masked: bool,
    /// Value is materialized as a file on the runner; references substitute
    /// its content only when file expansion is requested.
    pub file: bool,
    /// Value is passed to the runner verbatim, never expanded.
    pub raw: bool,
}

impl Variable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            public: true,
            masked: false,
            file: false,
            raw: false,
        }
    }

    pub fn public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn masked(mut self, masked: bool) -> Self {
        self.masked = masked;
        self
    }

    pub fn file(mut self, file: bool) -> Self {
        self.file = file;
        self
    }

    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }
}

/// Ordered collection of variables with last-wins key resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableCollection {
    items: Vec<Variable>,
}

impl VariableCollection {
    pub fn new(items: Vec<Variable>) -> Self {
        Self { items }
    }

    /// Append a variable, returning the collection for chaining.
    pub fn append(mut self, variable: Variable) -> Self {
        self.items.push(variable);
        self
    }

    /// Append every variable from another sequence or collection.
    pub fn concat(mut self, other: impl IntoIterator<Item = Variable>) -> Self {
        self.items.extend(other);
        self
    }

    /// The most recently declared variable with this key.
    pub fn get(&self, key: &str) -> Option<&Variable> {
        self.items.iter().rev().find(|v| v.key == key)
    }

    /// Every declared variable with this key, in declaration order.
    pub fn all(&self, key: &str) -> Vec<&Variable> {
        self.items.iter().filter(|v| v.key == key).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.items.iter()
    }

    /// Keep only variables matching the predicate, preserving order.
    pub fn retain(mut self, predicate: impl FnMut(&Variable) -> bool) -> Self {
        self.items.retain(predicate);
        self
    }

    /// Fold into a key/value map, later duplicates overriding earlier ones.
    pub fn to_hash_map(&self) -> HashMap<String, String> {
        self.items
            .iter()
            .map(|v| (v.key.clone(), v.value.clone()))
            .collect()
    }
}

impl FromIterator<Variable> for VariableCollection {
    fn from_iter<T: IntoIterator<Item = Variable>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for VariableCollection {
    type Item = Variable;
    type IntoIter = std::vec::IntoIter<Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a VariableCollection {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
