//! Error types for the kinematic tree and motion data model.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, Error>;

/// Errors describing a malformed kinematic tree, or a tree that does not
/// match the motion data it is used with.
///
/// These are fatal: a tree that fails validation is never constructed, so
/// downstream code can rely on the invariants holding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// The tree has no node without a parent.
    #[error("no root node found in the kinematic tree")]
    NoRoot,

    /// More than one node has no parent.
    #[error("multiple root nodes found: {0:?}")]
    MultipleRoots(Vec<String>),

    /// A node names a parent that is not part of the tree.
    #[error("parent '{parent}' of node '{node}' not found in the tree")]
    MissingParent {
        /// The node with the dangling reference.
        node: String,
        /// The missing parent name.
        parent: String,
    },

    /// Following parent references from a node never reaches the root.
    #[error("circular reference detected involving node '{0}'")]
    CircularReference(String),

    /// Motion data is bound to a different kinematic tree than the one
    /// being operated on.
    #[error("motion data is bound to a different kinematic tree")]
    TreeMismatch,
}

/// A joint name lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("node '{0}' not found in the kinematic tree")]
pub struct NotFoundError(pub String);

/// Errors describing inconsistent motion data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// A track's frame count disagrees with the rest of the container.
    #[error("track for '{node}' must have {expected} frames, got {got}")]
    FrameCountMismatch {
        /// The offending node.
        node: String,
        /// Frames in the offending track.
        got: usize,
        /// Frames expected from the other tracks.
        expected: usize,
    },

    /// An operation needs a position track the container does not carry.
    #[error("no position track for '{0}'")]
    MissingPositions(String),

    /// An operation needs a rotation track the container does not carry.
    #[error("no rotation track for '{0}'")]
    MissingRotations(String),

    /// A frame index is past the end of the data.
    #[error("frame {frame} out of range ({frames} frames)")]
    FrameOutOfRange {
        /// Requested frame.
        frame: usize,
        /// Frames available.
        frames: usize,
    },

    /// Frame time must be a positive duration.
    #[error("frame time must be positive, got {0}")]
    InvalidFrameTime(f64),
}

/// Top-level error type for the core data model.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed tree structure.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// Unknown joint name.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Inconsistent motion data.
    #[error(transparent)]
    Data(#[from] DataError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NotFoundError("HEAD".to_string());
        assert_eq!(err.to_string(), "node 'HEAD' not found in the kinematic tree");

        let err = StructuralError::MissingParent {
            node: "KNEE_LEFT".to_string(),
            parent: "HIP_LEFT".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parent 'HIP_LEFT' of node 'KNEE_LEFT' not found in the tree"
        );
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: Error = NotFoundError("PELVIS".to_string()).into();
        assert!(matches!(err, Error::NotFound(_)));

        let err: Error = DataError::FrameOutOfRange { frame: 9, frames: 3 }.into();
        assert_eq!(err.to_string(), "frame 9 out of range (3 frames)");
    }
}
