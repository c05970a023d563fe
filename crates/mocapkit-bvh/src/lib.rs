//! mocapkit BVH serialization
//!
//! Reads and writes the BVH hierarchical animation text format for
//! [`mocapkit_core`] trees and motion data.
//!
//! # Overview
//!
//! - [`save_bvh`] / [`write_bvh`] - serialize a tree plus rotational motion:
//!   hierarchy block in the tree's canonical pre-order, motion block with one
//!   row of channel values per frame, orientations converted to Euler degrees
//!   in each node's declared rotation order.
//! - [`load_bvh`] / [`parse_bvh`] - parse BVH text back into a validated
//!   tree, motion data, and per-node channel layouts.
//! - [`Channel`], [`RotationOrder`], [`ChannelLayout`] - the channel
//!   vocabulary shared by both directions, kept in one place so the declared
//!   channels and the numeric conversion cannot drift apart.
//!
//! The default layout gives the root position plus rotation channels and
//! every other joint rotation channels, in ZXY order; both directions accept
//! per-node overrides.
//!
//! # Example
//!
//! ```
//! use mocapkit_bvh::{parse_bvh, write_bvh};
//! use mocapkit_core::{KinematicTree, MotionData, Node};
//! use nalgebra::{Point3, UnitQuaternion, Vector3};
//! use std::sync::Arc;
//!
//! let tree = Arc::new(KinematicTree::from_nodes(vec![
//!     Node::root("Hips"),
//!     Node::new("Spine", "Hips").with_offset(Vector3::new(0.0, 10.0, 0.0)),
//! ])?);
//! let motion = MotionData::builder(Arc::clone(&tree))
//!     .positions("Hips", vec![Point3::origin()])
//!     .rotations("Hips", vec![UnitQuaternion::identity()])
//!     .rotations("Spine", vec![UnitQuaternion::identity()])
//!     .build()?;
//!
//! let mut text = Vec::new();
//! write_bvh(&tree, &motion, &mut text)?;
//! let loaded = parse_bvh(std::str::from_utf8(&text).unwrap())?;
//! assert_eq!(loaded.motion.frame_count(), 1);
//! # Ok::<(), mocapkit_bvh::BvhError>(())
//! ```

mod error;
mod euler;
mod layout;
mod loader;
mod saver;
mod types;

pub use error::{BvhError, BvhResult, ParseError};
pub use layout::ChannelLayout;
pub use loader::{load_bvh, parse_bvh, LoadedBvh};
pub use saver::{save_bvh, save_bvh_with_layouts, write_bvh, write_bvh_with_layouts};
pub use types::{Channel, RotationOrder};
