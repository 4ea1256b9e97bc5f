//! Path navigation and whole-tree visits over wrapped values.

use crate::path::{NodePath, PathSegment};
use crate::value::{ValueKind, WrappedValue};
use indexmap::IndexSet;

impl WrappedValue {
    /// The node at `path`, if every segment resolves.
    pub fn at_path(&self, path: &NodePath) -> Option<&WrappedValue> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match segment {
                PathSegment::Key(key) => node.get(key),
                PathSegment::Index(index) => node.get_index(*index),
            })
    }

    /// The node at a dotted path such as `server.hosts[0]`.
    pub fn lookup(&self, path: &str) -> Option<&WrappedValue> {
        self.at_path(&NodePath::parse(path)?)
    }

    /// Visit every node in pre-order, parents before children, entries and
    /// items in order.
    pub fn walk<F>(&self, mut visitor: F)
    where
        F: FnMut(&NodePath, &WrappedValue),
    {
        let mut path = NodePath::root();
        walk_node(self, &mut path, &mut visitor);
    }

    /// Nodes without children (scalars and empty containers), with their
    /// paths, in pre-order.
    pub fn leaves(&self) -> Vec<(NodePath, &WrappedValue)> {
        let mut leaves = Vec::new();
        let mut path = NodePath::root();
        collect_leaves(self, &mut path, &mut leaves);
        leaves
    }

    /// Length of the longest history anywhere in the tree.
    pub fn max_history_len(&self) -> usize {
        let mut max = 0usize;
        self.walk(|_, node| max = max.max(node.provenance().len()));
        max
    }

    /// Distinct current categories in the tree, in order of first appearance.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: IndexSet<String> = IndexSet::new();
        self.walk(|_, node| {
            let category = node.provenance().current().category();
            if !seen.contains(category) {
                seen.insert(category.to_string());
            }
        });
        seen.into_iter().collect()
    }
}

fn walk_node<F>(node: &WrappedValue, path: &mut NodePath, visitor: &mut F)
where
    F: FnMut(&NodePath, &WrappedValue),
{
    visitor(path, node);
    match node.kind() {
        ValueKind::Mapping(entries) => {
            for (key, child) in entries {
                path.push(PathSegment::Key(key.clone()));
                walk_node(child, path, visitor);
                path.pop();
            }
        }
        ValueKind::Sequence(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                walk_node(child, path, visitor);
                path.pop();
            }
        }
        ValueKind::Scalar(_) => {}
    }
}

fn collect_leaves<'a>(
    node: &'a WrappedValue,
    path: &mut NodePath,
    leaves: &mut Vec<(NodePath, &'a WrappedValue)>,
) {
    match node.kind() {
        ValueKind::Mapping(entries) if !entries.is_empty() => {
            for (key, child) in entries {
                path.push(PathSegment::Key(key.clone()));
                collect_leaves(child, path, leaves);
                path.pop();
            }
        }
        ValueKind::Sequence(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                collect_leaves(child, path, leaves);
                path.pop();
            }
        }
        _ => leaves.push((path.clone(), node)),
    }
}
