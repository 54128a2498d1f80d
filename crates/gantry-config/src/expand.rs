//! Reference expansion over variable collections.
//!
//! Values may reference other variables as `$NAME` or `${NAME}`. `$$` is an
//! escaped dollar and `%%` is a foreign-template marker; both pass through
//! byte-for-byte. Expansion resolves references against the most recently
//! declared variable for each key.

use regex::{Captures, Regex};
use std::collections::{HashMap, VecDeque};
use std::sync::LazyLock;
use tracing::info;

use crate::variables::{Variable, VariableCollection};

// One left-to-right pass: the escape alternatives come first, so `$$VAR`
// never yields a reference to `VAR`.
static REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$|%%|\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}|\$([a-zA-Z_][a-zA-Z0-9_]*)").unwrap()
});

/// Controls for reference expansion.
#[derive(Debug, Clone, Copy)]
pub struct ExpandOptions {
    /// Keep the literal reference text for undefined variables instead of
    /// substituting an empty string.
    pub keep_undefined: bool,
    /// Substitute the content of file-backed variables when referenced.
    /// When false, references to file variables keep their literal text.
    pub expand_file_refs: bool,
    /// Substitute the literal value of raw variables when referenced.
    /// When false, references to raw variables keep their literal text.
    pub expand_raw_refs: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            keep_undefined: false,
            expand_file_refs: true,
            expand_raw_refs: true,
        }
    }
}

impl VariableCollection {
    /// Expand every reference in `value` against the current (unexpanded)
    /// values of this collection.
    pub fn expand_value(&self, value: &str, opts: &ExpandOptions) -> String {
        let lookup = self.last_wins_lookup();
        substitute(value, opts, &lookup, None)
    }

    /// Expand every variable in the collection against the final, fully
    /// expanded values of the variables it references.
    ///
    /// Resolution happens in dependency order (Kahn's algorithm over an
    /// adjacency list keyed by variable name); the returned collection
    /// keeps the original item order, duplicates included. If the
    /// dependency graph contains a cycle the collection is returned
    /// unchanged: no partial expansion, no error.
    pub fn sort_and_expand_all(&self, opts: &ExpandOptions) -> VariableCollection {
        let lookup = self.last_wins_lookup();

        let Some(resolved) = resolve_in_dependency_order(&lookup, opts) else {
            return self.clone();
        };

        self.iter()
            .map(|item| {
                if item.raw {
                    item.clone()
                } else {
                    let mut expanded = item.clone();
                    expanded.value = substitute(&item.value, opts, &lookup, Some(&resolved));
                    expanded
                }
            })
            .collect()
    }

    fn last_wins_lookup(&self) -> HashMap<&str, &Variable> {
        let mut lookup = HashMap::new();
        for item in self.iter() {
            lookup.insert(item.key.as_str(), item);
        }
        lookup
    }
}

/// Names referenced by a value, in scan order. Escapes contribute nothing.
fn references(value: &str) -> Vec<&str> {
    REFERENCE_REGEX
        .captures_iter(value)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .collect()
}

/// Resolve the final value of every variable name, processing dependencies
/// first. Returns `None` when the graph has a cycle.
fn resolve_in_dependency_order(
    lookup: &HashMap<&str, &Variable>,
    opts: &ExpandOptions,
) -> Option<HashMap<String, String>> {
    // Edges point from a variable to the variables that reference it; raw
    // variables never expand, so they have no outgoing dependencies.
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();

    for (&name, variable) in lookup {
        in_degree.entry(name).or_insert(0);
        if variable.raw {
            continue;
        }
        let mut deps: Vec<&str> = references(&variable.value)
            .into_iter()
            .filter(|dep| lookup.contains_key(dep))
            .collect();
        deps.sort_unstable();
        deps.dedup();
        if deps.contains(&name) {
            // Self-reference is a one-node cycle.
            return None;
        }
        for dep in deps {
            dependents.entry(dep).or_default().push(name);
            *in_degree.entry(name).or_insert(0) += 1;
        }
    }

    let mut ready: VecDeque<&str> = lookup
        .keys()
        .filter(|name| in_degree[*name] == 0)
        .copied()
        .collect();

    let mut resolved: HashMap<String, String> = HashMap::new();
    while let Some(name) = ready.pop_front() {
        let variable = lookup[name];
        let value = if variable.raw {
            variable.value.clone()
        } else {
            substitute(&variable.value, opts, lookup, Some(&resolved))
        };
        resolved.insert(name.to_string(), value);

        for &dependent in dependents.get(name).map(Vec::as_slice).unwrap_or(&[]) {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push_back(dependent);
                }
            }
        }
    }

    // Leftover nodes are part of a cycle.
    if resolved.len() == lookup.len() {
        Some(resolved)
    } else {
        None
    }
}

/// Substitute each reference in `value`. When `resolved` is given,
/// non-raw referenced variables substitute their fully expanded value;
/// otherwise their current value is used.
fn substitute(
    value: &str,
    opts: &ExpandOptions,
    lookup: &HashMap<&str, &Variable>,
    resolved: Option<&HashMap<String, String>>,
) -> String {
    REFERENCE_REGEX
        .replace_all(value, |caps: &Captures| {
            let full = &caps[0];
            let Some(name) = caps.get(1).or_else(|| caps.get(2)) else {
                // `$$` or `%%`: pass through verbatim.
                return full.to_string();
            };
            let name = name.as_str();

            match lookup.get(name) {
                Some(variable) if variable.file => {
                    info!(
                        event = "file_variable_referenced",
                        variable = %variable.key,
                        "file-backed variable referenced by another variable"
                    );
                    if opts.expand_file_refs {
                        final_value(variable, resolved)
                    } else {
                        full.to_string()
                    }
                }
                Some(variable) if variable.raw => {
                    // The raw value may itself contain reference syntax the
                    // runner expands later; substitute it literally or keep
                    // the reference untouched.
                    if opts.expand_raw_refs {
                        variable.value.clone()
                    } else {
                        full.to_string()
                    }
                }
                Some(variable) => final_value(variable, resolved),
                None if opts.keep_undefined => full.to_string(),
                None => String::new(),
            }
        })
        .into_owned()
}

fn final_value(variable: &Variable, resolved: Option<&HashMap<String, String>>) -> String {
    resolved
        .and_then(|map| map.get(&variable.key))
        .cloned()
        .unwrap_or_else(|| variable.value.clone())
}
