//! Forward kinematics: reconstruct global joint positions from local
//! rotations.
//!
//! This is the inverse of [`pos2rot`](crate::pos2rot) and is what the
//! round-trip accuracy tests lean on: solving rotations from positions and
//! running them back through the tree must land on the original positions.

use std::collections::HashMap;

use nalgebra::{Point3, UnitQuaternion};

use mocapkit_core::{Error, MotionData};

/// Computes per-joint global positions from a rotational [`MotionData`].
///
/// Local rotations are composed down the tree from the root; each child is
/// placed at its parent's position plus the parent's world orientation
/// applied to the child's rest offset, scaled by `scale`. The root is placed
/// at its own position track when present, at the origin otherwise.
///
/// Joints without a rotation track end the walk along their branch (their
/// own position is still reported; an end effector needs no rotation).
pub fn rot2pos(
    motion: &MotionData,
    scale: f64,
) -> Result<HashMap<String, Vec<Point3<f64>>>, Error> {
    let tree = motion.tree();
    let frames = motion.frame_count();
    let root = tree.root().name();

    let root_track = if motion.has_positions(root) {
        motion.positions(root)?.to_vec()
    } else {
        vec![Point3::origin(); frames]
    };

    let mut positions = HashMap::with_capacity(tree.len());
    let parent_orientation = vec![UnitQuaternion::identity(); frames];
    walk(motion, root, root_track, &parent_orientation, scale, &mut positions)?;
    Ok(positions)
}

fn walk(
    motion: &MotionData,
    name: &str,
    track: Vec<Point3<f64>>,
    parent_orientation: &[UnitQuaternion<f64>],
    scale: f64,
    positions: &mut HashMap<String, Vec<Point3<f64>>>,
) -> Result<(), Error> {
    if !motion.has_rotations(name) {
        positions.insert(name.to_string(), track);
        return Ok(());
    }

    let local = motion.rotations(name)?;
    let orientation: Vec<UnitQuaternion<f64>> = parent_orientation
        .iter()
        .zip(local)
        .map(|(parent, local)| parent * local)
        .collect();

    let tree = motion.tree();
    for child in tree.children(name)? {
        let offset = *tree.node(child)?.offset();
        let child_track: Vec<Point3<f64>> = track
            .iter()
            .zip(&orientation)
            .map(|(position, rotation)| position + (rotation * offset) * scale)
            .collect();
        walk(motion, child, child_track, &orientation, scale, positions)?;
    }

    positions.insert(name.to_string(), track);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mocapkit_core::{KinematicTree, Node};
    use nalgebra::Vector3;
    use std::f64::consts::FRAC_PI_2;
    use std::sync::Arc;

    #[test]
    fn test_rotated_chain_positions() {
        let tree = Arc::new(
            KinematicTree::from_nodes(vec![
                Node::root("SHOULDER"),
                Node::new("ELBOW", "SHOULDER").with_offset(Vector3::new(0.0, 2.0, 0.0)),
                Node::new("WRIST", "ELBOW").with_offset(Vector3::new(0.0, 1.0, 0.0)),
            ])
            .unwrap(),
        );
        // Shoulder bends the whole arm 90 degrees about -z; the elbow stays
        // straight. World positions must follow the bend.
        let bend = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -FRAC_PI_2);
        let motion = MotionData::builder(tree)
            .positions("SHOULDER", vec![Point3::new(0.0, 10.0, 0.0)])
            .rotations("SHOULDER", vec![bend])
            .rotations("ELBOW", vec![UnitQuaternion::identity()])
            .rotations("WRIST", vec![UnitQuaternion::identity()])
            .build()
            .unwrap();

        let positions = rot2pos(&motion, 1.0).unwrap();
        assert_relative_eq!(
            positions["ELBOW"][0],
            Point3::new(2.0, 10.0, 0.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            positions["WRIST"][0],
            Point3::new(3.0, 10.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_scale_applies_to_every_bone() {
        let tree = Arc::new(
            KinematicTree::from_nodes(vec![
                Node::root("A"),
                Node::new("B", "A").with_offset(Vector3::new(0.0, 1.0, 0.0)),
            ])
            .unwrap(),
        );
        let motion = MotionData::builder(tree)
            .rotations("A", vec![UnitQuaternion::identity()])
            .rotations("B", vec![UnitQuaternion::identity()])
            .build()
            .unwrap();

        let positions = rot2pos(&motion, 2.5).unwrap();
        assert_relative_eq!(positions["B"][0], Point3::new(0.0, 2.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_missing_root_positions_default_to_origin() {
        let tree = Arc::new(KinematicTree::from_nodes(vec![Node::root("A")]).unwrap());
        let motion = MotionData::builder(tree)
            .rotations("A", vec![UnitQuaternion::identity(); 3])
            .build()
            .unwrap();
        let positions = rot2pos(&motion, 1.0).unwrap();
        assert_eq!(positions["A"], vec![Point3::origin(); 3]);
    }
}
