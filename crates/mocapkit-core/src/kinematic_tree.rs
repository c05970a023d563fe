//! The kinematic tree: a validated, immutable hierarchy of named joints.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use nalgebra::Vector3;

use crate::error::{NotFoundError, StructuralError};
use crate::node::Node;

/// An immutable kinematic tree representing a hierarchy of joints and end
/// effectors.
///
/// The tree is validated once at construction and never modified afterwards;
/// derived trees (e.g. with recalibrated offsets) are new instances. Node
/// declaration order is preserved, so child ordering - and with it the
/// canonical pre-order traversal - is stable across calibration and
/// serialization.
///
/// # Invariants
///
/// - node names are unique;
/// - exactly one node has no parent (the root);
/// - every parent reference resolves to a node in the tree;
/// - the parent graph is acyclic and connected.
///
/// Construction fails with a [`StructuralError`] if any invariant is broken.
///
/// # Example
///
/// ```
/// use mocapkit_core::{KinematicTree, Node};
///
/// let tree = KinematicTree::from_nodes(vec![
///     Node::root("PELVIS"),
///     Node::new("SPINE_NAVEL", "PELVIS"),
/// ])?;
/// assert_eq!(tree.root().name(), "PELVIS");
/// # Ok::<(), mocapkit_core::StructuralError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicTree {
    nodes: IndexMap<String, Node>,
    children: HashMap<String, Vec<String>>,
    root: String,
}

impl KinematicTree {
    /// Builds a tree from a list of nodes, in declaration order.
    ///
    /// The order of `nodes` determines child ordering everywhere the tree is
    /// traversed.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, StructuralError> {
        let mut map: IndexMap<String, Node> = IndexMap::with_capacity(nodes.len());
        for node in nodes {
            map.insert(node.name().to_string(), node);
        }
        Self::from_node_map(map)
    }

    fn from_node_map(nodes: IndexMap<String, Node>) -> Result<Self, StructuralError> {
        let roots: Vec<&Node> = nodes.values().filter(|n| n.is_root()).collect();
        let root = match roots.as_slice() {
            [] => return Err(StructuralError::NoRoot),
            [root] => root.name().to_string(),
            many => {
                return Err(StructuralError::MultipleRoots(
                    many.iter().map(|n| n.name().to_string()).collect(),
                ))
            }
        };

        let mut children: HashMap<String, Vec<String>> = HashMap::with_capacity(nodes.len());
        for node in nodes.values() {
            children.entry(node.name().to_string()).or_default();
            if let Some(parent) = node.parent() {
                if !nodes.contains_key(parent) {
                    return Err(StructuralError::MissingParent {
                        node: node.name().to_string(),
                        parent: parent.to_string(),
                    });
                }
                children
                    .entry(parent.to_string())
                    .or_default()
                    .push(node.name().to_string());
            }
        }

        let tree = Self {
            nodes,
            children,
            root,
        };
        tree.check_acyclic()?;
        Ok(tree)
    }

    /// Walks every node's parent chain; a chain that revisits a node is a
    /// cycle. With the single-root and parent-resolution checks already done,
    /// this also guarantees the tree is connected.
    fn check_acyclic(&self) -> Result<(), StructuralError> {
        let mut cleared: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        for start in self.nodes.values() {
            let mut path: HashSet<&str> = HashSet::new();
            let mut current = start.name();
            loop {
                if cleared.contains(current) {
                    break;
                }
                if !path.insert(current) {
                    return Err(StructuralError::CircularReference(current.to_string()));
                }
                match self.nodes[current].parent() {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
            cleared.extend(path);
        }
        Ok(())
    }

    /// Looks up a node by name.
    pub fn node(&self, name: &str) -> Result<&Node, NotFoundError> {
        self.nodes
            .get(name)
            .ok_or_else(|| NotFoundError(name.to_string()))
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.nodes[&self.root]
    }

    /// The names of a node's children, in declaration order.
    pub fn children(&self, name: &str) -> Result<&[String], NotFoundError> {
        self.children
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| NotFoundError(name.to_string()))
    }

    /// The parent of a node, or `None` for the root.
    pub fn parent(&self, name: &str) -> Result<Option<&Node>, NotFoundError> {
        let node = self.node(name)?;
        Ok(node.parent().map(|p| &self.nodes[p]))
    }

    /// True if the node has no children.
    pub fn is_leaf(&self, name: &str) -> Result<bool, NotFoundError> {
        Ok(self.children(name)?.is_empty())
    }

    /// True if the node has at least one sibling.
    pub fn has_siblings(&self, name: &str) -> Result<bool, NotFoundError> {
        match self.node(name)?.parent() {
            Some(parent) => Ok(self.children[parent].len() > 1),
            None => Ok(false),
        }
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree has no nodes. Never true for a validated tree, but
    /// kept so `len` follows the usual container contract.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if a node with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Iterates over all nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Deterministic pre-order traversal from the root.
    ///
    /// Every node is yielded strictly after its parent, children in
    /// declaration order. The iterator is lazy and can be restarted by
    /// calling this method again. Calibration and BVH serialization both use
    /// this order, which is what keeps channel columns aligned with the
    /// declared hierarchy.
    pub fn iter_preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![self.root.as_str()],
        }
    }

    /// Returns a new tree with the same topology and the given replacement
    /// offsets. Joints absent from `offsets` keep their current offset.
    pub fn with_offsets(&self, offsets: &HashMap<String, Vector3<f64>>) -> Self {
        let nodes: IndexMap<String, Node> = self
            .nodes
            .iter()
            .map(|(name, node)| {
                let node = match offsets.get(name) {
                    Some(offset) => node.clone().with_offset(*offset),
                    None => node.clone(),
                };
                (name.clone(), node)
            })
            .collect();
        // Topology is untouched, so revalidation cannot fail.
        Self {
            nodes,
            children: self.children.clone(),
            root: self.root.clone(),
        }
    }
}

/// Lazy pre-order traversal over a [`KinematicTree`].
pub struct Preorder<'a> {
    tree: &'a KinematicTree,
    stack: Vec<&'a str>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.stack.pop()?;
        let children = &self.tree.children[name];
        for child in children.iter().rev() {
            self.stack.push(child);
        }
        Some(&self.tree.nodes[name])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> KinematicTree {
        KinematicTree::from_nodes(vec![
            Node::root("PELVIS"),
            Node::new("SPINE_NAVEL", "PELVIS"),
            Node::new("SPINE_CHEST", "SPINE_NAVEL"),
            Node::new("HIP_LEFT", "PELVIS"),
            Node::new("HIP_RIGHT", "PELVIS"),
        ])
        .unwrap()
    }

    #[test]
    fn test_root_and_lookup() {
        let tree = chain();
        assert_eq!(tree.root().name(), "PELVIS");
        assert_eq!(tree.node("SPINE_CHEST").unwrap().parent(), Some("SPINE_NAVEL"));
        assert_eq!(
            tree.node("MISSING").unwrap_err(),
            NotFoundError("MISSING".to_string())
        );
    }

    #[test]
    fn test_children_declaration_order() {
        let tree = chain();
        assert_eq!(
            tree.children("PELVIS").unwrap(),
            &["SPINE_NAVEL".to_string(), "HIP_LEFT".to_string(), "HIP_RIGHT".to_string()]
        );
        assert!(tree.is_leaf("SPINE_CHEST").unwrap());
        assert!(tree.has_siblings("HIP_LEFT").unwrap());
        assert!(!tree.has_siblings("PELVIS").unwrap());
    }

    #[test]
    fn test_preorder_parent_before_descendants() {
        let tree = chain();
        let order: Vec<&str> = tree.iter_preorder().map(|n| n.name()).collect();
        assert_eq!(
            order,
            vec!["PELVIS", "SPINE_NAVEL", "SPINE_CHEST", "HIP_LEFT", "HIP_RIGHT"]
        );
        for (i, node) in tree.iter_preorder().enumerate() {
            if let Some(parent) = node.parent() {
                let parent_idx = order.iter().position(|n| *n == parent).unwrap();
                assert!(parent_idx < i, "parent '{parent}' must precede '{}'", node.name());
            }
        }
    }

    #[test]
    fn test_preorder_is_restartable() {
        let tree = chain();
        let first: Vec<&str> = tree.iter_preorder().map(|n| n.name()).collect();
        let second: Vec<&str> = tree.iter_preorder().map(|n| n.name()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_root_rejected() {
        let err = KinematicTree::from_nodes(vec![Node::new("A", "B"), Node::new("B", "A")])
            .unwrap_err();
        assert!(matches!(err, StructuralError::CircularReference(_) | StructuralError::NoRoot));
    }

    #[test]
    fn test_multiple_roots_rejected() {
        let err =
            KinematicTree::from_nodes(vec![Node::root("A"), Node::root("B")]).unwrap_err();
        assert_eq!(
            err,
            StructuralError::MultipleRoots(vec!["A".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn test_missing_parent_rejected() {
        let err = KinematicTree::from_nodes(vec![Node::root("A"), Node::new("B", "GHOST")])
            .unwrap_err();
        assert_eq!(
            err,
            StructuralError::MissingParent {
                node: "B".to_string(),
                parent: "GHOST".to_string(),
            }
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let err = KinematicTree::from_nodes(vec![
            Node::root("ROOT"),
            Node::new("A", "B"),
            Node::new("B", "A"),
        ])
        .unwrap_err();
        assert!(matches!(err, StructuralError::CircularReference(_)));
    }

    #[test]
    fn test_with_offsets_keeps_topology() {
        let tree = chain();
        let mut offsets = HashMap::new();
        offsets.insert("HIP_LEFT".to_string(), Vector3::new(9.0, 0.0, 0.0));
        let adjusted = tree.with_offsets(&offsets);

        assert_eq!(adjusted.node("HIP_LEFT").unwrap().offset(), &Vector3::new(9.0, 0.0, 0.0));
        assert_eq!(adjusted.node("HIP_RIGHT").unwrap().offset(), &Vector3::zeros());
        let order: Vec<&str> = adjusted.iter_preorder().map(|n| n.name()).collect();
        assert_eq!(
            order,
            vec!["PELVIS", "SPINE_NAVEL", "SPINE_CHEST", "HIP_LEFT", "HIP_RIGHT"]
        );
    }
}
