//! Namespace hierarchy and root resolution.
//!
//! CI-minutes quotas are tracked at the top of the namespace hierarchy, so
//! every admission decision starts by resolving a build's namespace to its
//! root. Two strategies exist: an O(1) lookup through the materialized
//! `traversal_ids` ancestry, and a parent-walk fallback for namespaces
//! whose ancestry has not been materialized yet. Both must agree.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ResourceId;

/// A group or user namespace. Projects hang off namespaces; namespaces
/// form a tree rooted at top-level groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    pub id: ResourceId,
    /// Parent namespace, `None` for top-level namespaces.
    pub parent_id: Option<ResourceId>,
    /// Materialized root-first ancestry (`traversal_ids[0]` is the root).
    /// Empty when the ancestry has not been computed for this namespace.
    pub traversal_ids: Vec<ResourceId>,
    /// Direct owners, used to validate additional-pack transfers.
    pub owner_ids: Vec<ResourceId>,
}

impl Namespace {
    /// A top-level namespace with a materialized ancestry of itself.
    pub fn root(id: ResourceId) -> Self {
        Self {
            id,
            parent_id: None,
            traversal_ids: vec![id],
            owner_ids: Vec::new(),
        }
    }

    /// A child namespace with a materialized ancestry.
    pub fn child_of(id: ResourceId, parent: &Namespace) -> Self {
        let mut traversal_ids = parent.traversal_ids.clone();
        traversal_ids.push(id);
        Self {
            id,
            parent_id: Some(parent.id),
            traversal_ids,
            owner_ids: Vec::new(),
        }
    }

    pub fn with_owners(mut self, owner_ids: Vec<ResourceId>) -> Self {
        self.owner_ids = owner_ids;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Which root-resolution strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootLookup {
    /// `traversal_ids[0]`, falling back to the parent walk when the
    /// ancestry is not materialized.
    TraversalIds,
    /// Walk `parent_id` links to the top.
    ParentWalk,
}

/// In-memory view of the namespace tree, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct NamespaceIndex {
    by_id: HashMap<ResourceId, Namespace>,
}

impl NamespaceIndex {
    pub fn new(namespaces: impl IntoIterator<Item = Namespace>) -> Self {
        Self {
            by_id: namespaces.into_iter().map(|ns| (ns.id, ns)).collect(),
        }
    }

    pub fn get(&self, id: ResourceId) -> Option<&Namespace> {
        self.by_id.get(&id)
    }

    pub fn insert(&mut self, namespace: Namespace) {
        self.by_id.insert(namespace.id, namespace);
    }

    /// Resolve the root namespace of `id`.
    ///
    /// A namespace unknown to the index resolves to itself: quota lookups
    /// for it will find no record and degrade to unlimited rather than
    /// blocking dispatch.
    pub fn root_of(&self, id: ResourceId, lookup: RootLookup) -> ResourceId {
        match lookup {
            RootLookup::TraversalIds => self
                .by_id
                .get(&id)
                .and_then(|ns| ns.traversal_ids.first().copied())
                .unwrap_or_else(|| self.root_by_parents(id)),
            RootLookup::ParentWalk => self.root_by_parents(id),
        }
    }

    fn root_by_parents(&self, id: ResourceId) -> ResourceId {
        let mut current = id;
        // Guard against malformed parent links forming a loop.
        let mut hops = 0usize;
        while let Some(parent) = self.by_id.get(&current).and_then(|ns| ns.parent_id) {
            hops += 1;
            if hops > self.by_id.len() {
                return id;
            }
            current = parent;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (NamespaceIndex, ResourceId, ResourceId) {
        let root = Namespace::root(ResourceId::new());
        let mid = Namespace::child_of(ResourceId::new(), &root);
        let leaf = Namespace::child_of(ResourceId::new(), &mid);
        let (root_id, leaf_id) = (root.id, leaf.id);
        (NamespaceIndex::new([root, mid, leaf]), root_id, leaf_id)
    }

    #[test]
    fn test_root_of_via_traversal_ids() {
        let (index, root_id, leaf_id) = tree();
        assert_eq!(index.root_of(leaf_id, RootLookup::TraversalIds), root_id);
    }

    #[test]
    fn test_root_of_via_parent_walk() {
        let (index, root_id, leaf_id) = tree();
        assert_eq!(index.root_of(leaf_id, RootLookup::ParentWalk), root_id);
    }

    #[test]
    fn test_both_strategies_agree() {
        let (index, _, leaf_id) = tree();
        assert_eq!(
            index.root_of(leaf_id, RootLookup::TraversalIds),
            index.root_of(leaf_id, RootLookup::ParentWalk)
        );
    }

    #[test]
    fn test_unmaterialized_ancestry_falls_back_to_parent_walk() {
        let root = Namespace::root(ResourceId::new());
        let mut child = Namespace::child_of(ResourceId::new(), &root);
        child.traversal_ids.clear();
        let (root_id, child_id) = (root.id, child.id);
        let index = NamespaceIndex::new([root, child]);

        assert_eq!(index.root_of(child_id, RootLookup::TraversalIds), root_id);
    }

    #[test]
    fn test_unknown_namespace_resolves_to_itself() {
        let index = NamespaceIndex::default();
        let id = ResourceId::new();
        assert_eq!(index.root_of(id, RootLookup::TraversalIds), id);
        assert_eq!(index.root_of(id, RootLookup::ParentWalk), id);
    }

    #[test]
    fn test_parent_loop_does_not_hang() {
        let a = ResourceId::new();
        let b = ResourceId::new();
        let mut index = NamespaceIndex::default();
        index.insert(Namespace {
            id: a,
            parent_id: Some(b),
            traversal_ids: vec![],
            owner_ids: vec![],
        });
        index.insert(Namespace {
            id: b,
            parent_id: Some(a),
            traversal_ids: vec![],
            owner_ids: vec![],
        });

        assert_eq!(index.root_of(a, RootLookup::ParentWalk), a);
    }
}
