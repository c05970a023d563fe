//! Test fixture utilities: synthetic skeletons and motions with known ground
//! truth.

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::{Point3, UnitQuaternion, Vector3};

use mocapkit_core::{KinematicTree, MotionData, Node};
use mocapkit_solve::rot2pos;

/// A 4-joint arm chain with unit-ish bone lengths, all resting along +y.
pub fn arm_tree() -> Arc<KinematicTree> {
    Arc::new(
        KinematicTree::from_nodes(vec![
            Node::root("SHOULDER"),
            Node::new("ELBOW", "SHOULDER").with_offset(Vector3::new(0.0, 28.0, 0.0)),
            Node::new("WRIST", "ELBOW").with_offset(Vector3::new(0.0, 25.0, 0.0)),
            Node::new("HAND", "WRIST").with_offset(Vector3::new(0.0, 8.0, 0.0)),
        ])
        .unwrap(),
    )
}

/// A small humanoid: torso chain plus two two-bone legs, so the root is a
/// multi-child anchor and the legs are single-child chains.
pub fn humanoid_tree() -> Arc<KinematicTree> {
    Arc::new(
        KinematicTree::from_nodes(vec![
            Node::root("PELVIS"),
            Node::new("SPINE", "PELVIS").with_offset(Vector3::new(0.0, 20.0, 0.0)),
            Node::new("HEAD", "SPINE").with_offset(Vector3::new(0.0, 25.0, 0.0)),
            Node::new("HIP_LEFT", "PELVIS").with_offset(Vector3::new(-9.0, -5.0, 0.0)),
            Node::new("KNEE_LEFT", "HIP_LEFT").with_offset(Vector3::new(0.0, -40.0, 0.0)),
            Node::new("ANKLE_LEFT", "KNEE_LEFT").with_offset(Vector3::new(0.0, -38.0, 0.0)),
            Node::new("HIP_RIGHT", "PELVIS").with_offset(Vector3::new(9.0, -5.0, 0.0)),
            Node::new("KNEE_RIGHT", "HIP_RIGHT").with_offset(Vector3::new(0.0, -40.0, 0.0)),
            Node::new("ANKLE_RIGHT", "KNEE_RIGHT").with_offset(Vector3::new(0.0, -38.0, 0.0)),
        ])
        .unwrap(),
    )
}

/// Builds a rotational motion over `tree` from per-frame local rotations.
///
/// Joints absent from a frame's map get the identity; the root carries the
/// given position track.
pub fn rotational_motion(
    tree: &Arc<KinematicTree>,
    frames: &[HashMap<&str, UnitQuaternion<f64>>],
    root_positions: &[Point3<f64>],
) -> MotionData {
    let mut builder = MotionData::builder(Arc::clone(tree))
        .positions(tree.root().name(), root_positions.to_vec());
    for node in tree.nodes() {
        let track: Vec<UnitQuaternion<f64>> = frames
            .iter()
            .map(|frame| frame.get(node.name()).copied().unwrap_or_else(UnitQuaternion::identity))
            .collect();
        builder = builder.rotations(node.name(), track);
    }
    builder.build().expect("fixture motion is well-formed")
}

/// Runs known local rotations through forward kinematics and repackages the
/// resulting global positions as an observed capture.
///
/// This is the ground-truth generator for solver tests: the capture is
/// exactly reproducible by some rotation set, so the solver has no excuse.
pub fn capture_from_rotations(
    tree: &Arc<KinematicTree>,
    frames: &[HashMap<&str, UnitQuaternion<f64>>],
    root_positions: &[Point3<f64>],
) -> MotionData {
    let rotational = rotational_motion(tree, frames, root_positions);
    let positions = rot2pos(&rotational, 1.0).expect("fixture forward kinematics succeeds");

    let mut builder = MotionData::builder(Arc::clone(tree));
    for (name, track) in positions {
        builder = builder.positions(name, track);
    }
    builder.build().expect("fixture capture is well-formed")
}

/// Maximum positional error between two per-joint position maps.
pub fn max_position_error(
    left: &HashMap<String, Vec<Point3<f64>>>,
    right: &HashMap<String, Vec<Point3<f64>>>,
) -> f64 {
    let mut max = 0.0f64;
    for (name, track) in left {
        let other = &right[name];
        for (a, b) in track.iter().zip(other) {
            max = max.max((a - b).norm());
        }
    }
    max
}
