//! mocapkit core data model
//!
//! This crate provides the kinematic-tree and motion-data types shared by the
//! mocapkit solver and BVH serialization crates.
//!
//! # Overview
//!
//! - [`Node`] - one joint: name, parent reference, rest offset.
//! - [`KinematicTree`] - validated, immutable joint hierarchy with a stable
//!   pre-order traversal.
//! - [`MotionData`] - per-frame position and/or rotation tracks bound to a
//!   tree; frame counts validated at construction.
//! - [`error`] - fatal error taxonomy ([`StructuralError`], [`NotFoundError`],
//!   [`DataError`]).
//! - [`diagnostics`] - non-fatal [`ConversionWarning`]s with stable `W00x`
//!   codes, collected rather than thrown.
//! - [`device`] - nominal per-device topologies (Azure Kinect built in,
//!   others via JSON [`device::TopologyConfig`]).
//!
//! # Example
//!
//! ```
//! use mocapkit_core::{KinematicTree, MotionData, Node};
//! use nalgebra::{Point3, Vector3};
//! use std::sync::Arc;
//!
//! let tree = Arc::new(KinematicTree::from_nodes(vec![
//!     Node::root("PELVIS"),
//!     Node::new("SPINE_NAVEL", "PELVIS").with_offset(Vector3::new(0.0, 12.0, 0.0)),
//! ])?);
//!
//! let motion = MotionData::builder(Arc::clone(&tree))
//!     .positions("PELVIS", vec![Point3::origin()])
//!     .positions("SPINE_NAVEL", vec![Point3::new(0.0, 12.0, 0.0)])
//!     .build()?;
//!
//! assert_eq!(motion.frame_count(), 1);
//! # Ok::<(), mocapkit_core::Error>(())
//! ```

pub mod device;
pub mod diagnostics;
pub mod error;
mod kinematic_tree;
mod motion_data;
mod node;

pub use diagnostics::{ConversionWarning, WarningCode};
pub use error::{CoreResult, DataError, Error, NotFoundError, StructuralError};
pub use kinematic_tree::{KinematicTree, Preorder};
pub use motion_data::{MotionData, MotionDataBuilder, DEFAULT_FRAME_TIME};
pub use node::Node;
