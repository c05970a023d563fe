//! BVH write → parse round trips: the serialized text layout must preserve
//! topology, frame metadata, and channel values.

use std::collections::HashMap;

use nalgebra::{Point3, UnitQuaternion, Vector3};

use mocapkit_bvh::{load_bvh, parse_bvh, save_bvh, write_bvh, RotationOrder};
use mocapkit_tests::fixtures::{humanoid_tree, rotational_motion};
use pretty_assertions::assert_eq;

fn sample_frames(count: usize) -> Vec<HashMap<&'static str, UnitQuaternion<f64>>> {
    (0..count)
        .map(|frame| {
            let phase = frame as f64 * 0.7;
            let mut rotations = HashMap::new();
            rotations.insert(
                "PELVIS",
                UnitQuaternion::from_euler_angles(0.2 * phase.sin(), 0.1 * phase.cos(), 0.05),
            );
            rotations.insert(
                "HIP_LEFT",
                UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.8 * phase.sin()),
            );
            rotations.insert(
                "SPINE",
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.3 * phase.cos()),
            );
            rotations
        })
        .collect()
}

#[test]
fn test_write_parse_preserves_motion() {
    let tree = humanoid_tree();
    let frames = sample_frames(5);
    let roots: Vec<Point3<f64>> = (0..5).map(|i| Point3::new(i as f64, 95.0, 0.0)).collect();
    let motion = rotational_motion(&tree, &frames, &roots);

    let mut text = Vec::new();
    let warnings = write_bvh(&tree, &motion, &mut text).unwrap();
    assert!(warnings.is_empty());

    let loaded = parse_bvh(std::str::from_utf8(&text).unwrap()).unwrap();
    assert_eq!(loaded.motion.frame_count(), 5);
    assert!((loaded.motion.frame_time() - motion.frame_time()).abs() < 1e-6);

    // Root position track survives to 6-decimal precision.
    for (original, parsed) in motion
        .positions("PELVIS")
        .unwrap()
        .iter()
        .zip(loaded.motion.positions("PELVIS").unwrap())
    {
        assert!((original - parsed).norm() < 1e-5);
    }

    // Every serialized joint's orientation survives the Euler round trip.
    for name in ["PELVIS", "SPINE", "HIP_LEFT", "KNEE_LEFT"] {
        let original = motion.rotations(name).unwrap();
        let parsed = loaded.motion.rotations(name).unwrap();
        for (a, b) in original.iter().zip(parsed) {
            assert!(
                a.angle_to(b) < 1e-6,
                "rotation for {name} drifted: {:?} vs {:?}",
                a,
                b
            );
        }
    }

    // Channel declarations round trip too.
    assert_eq!(
        loaded.layouts["PELVIS"].rotation_order(),
        Some(RotationOrder::Zxy)
    );
    assert!(loaded.layouts["PELVIS"].has_position_channels());
    assert!(!loaded.layouts["SPINE"].has_position_channels());
}

#[test]
fn test_save_load_file_round_trip() {
    let tree = humanoid_tree();
    let frames = sample_frames(3);
    let roots = vec![Point3::new(0.0, 95.0, 0.0); 3];
    let motion = rotational_motion(&tree, &frames, &roots);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.bvh");
    save_bvh(&tree, &motion, &path).unwrap();

    let loaded = load_bvh(&path).unwrap();
    assert_eq!(loaded.motion.frame_count(), 3);

    // Saving what was loaded must reproduce the text byte for byte: the
    // serialized layout is already a fixed point of the round trip.
    let first = std::fs::read_to_string(&path).unwrap();
    let again_path = dir.path().join("clip2.bvh");
    save_bvh(loaded.motion.tree(), &loaded.motion, &again_path).unwrap();
    let second = std::fs::read_to_string(&again_path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_bvh("/nonexistent/clip.bvh").unwrap_err();
    assert!(matches!(err, mocapkit_bvh::BvhError::Io(_)));
}
