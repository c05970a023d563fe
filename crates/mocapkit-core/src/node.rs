//! A single joint in a kinematic tree.

use nalgebra::Vector3;

/// An immutable node in a kinematic tree, representing a joint or an end
/// effector.
///
/// Parent-child relationships are kept as name references rather than owned
/// links: the [`KinematicTree`](crate::KinematicTree) owns every node, and a
/// node only records the name of its parent. Modifications return a new node
/// instead of mutating in place.
///
/// # Example
///
/// ```
/// use mocapkit_core::Node;
/// use nalgebra::Vector3;
///
/// let root = Node::root("PELVIS");
/// let child = Node::new("SPINE_NAVEL", "PELVIS").with_offset(Vector3::new(0.0, 12.0, 0.0));
/// assert!(root.is_root());
/// assert_eq!(child.parent(), Some("PELVIS"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    parent: Option<String>,
    offset: Vector3<f64>,
}

impl Node {
    /// Creates a node attached to the named parent, with a zero rest offset.
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent.into()),
            offset: Vector3::zeros(),
        }
    }

    /// Creates a root node (no parent), with a zero rest offset.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            offset: Vector3::zeros(),
        }
    }

    /// Returns a copy of this node with the given rest offset.
    pub fn with_offset(mut self, offset: Vector3<f64>) -> Self {
        self.offset = offset;
        self
    }

    /// The unique name of this node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the parent node, or `None` for a root.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// The rest offset from the parent (direction times bone length).
    pub fn offset(&self) -> &Vector3<f64> {
        &self.offset
    }

    /// True if this node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
