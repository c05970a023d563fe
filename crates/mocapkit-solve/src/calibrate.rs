//! Rest-pose calibration: replace nominal rest offsets with offsets estimated
//! from observed positions.

use std::collections::HashMap;

use nalgebra::Vector3;

use mocapkit_core::{
    ConversionWarning, DataError, Error, KinematicTree, MotionData, WarningCode,
};

use crate::align::DIRECTION_EPS;

/// Result of calibration: the adjusted tree plus any fallback warnings.
#[derive(Debug)]
pub struct CalibrationOutcome {
    /// New tree with identical topology and recalibrated offsets.
    pub tree: KinematicTree,
    /// One [`WarningCode::CalibrationFallback`] per joint that kept its
    /// nominal offset.
    pub warnings: Vec<ConversionWarning>,
}

/// Recomputes every joint's rest offset from observed global positions.
///
/// For a joint J with parent P, the offset direction is taken from the
/// parent-to-joint vector at `reference_frame`, and the length is the mean of
/// that vector's length over all frames. Direction and length are estimated
/// independently so orientation noise in other frames cannot bias the bone
/// length. The root's offset becomes its observed position at
/// `reference_frame`.
///
/// A joint whose data cannot produce an offset (missing track for it or its
/// parent, or a zero-length direction at the reference frame) keeps its
/// nominal offset and is reported as a non-fatal
/// [`CalibrationFallback`](WarningCode::CalibrationFallback).
///
/// Inputs are not mutated; the returned tree is a new instance. Calibrating
/// twice against the same positions is idempotent up to floating-point
/// rounding, since the estimate depends only on the observations.
pub fn adjust_kinematic_tree(
    motion: &MotionData,
    reference_frame: usize,
) -> Result<CalibrationOutcome, Error> {
    let frames = motion.frame_count();
    if reference_frame >= frames {
        return Err(DataError::FrameOutOfRange {
            frame: reference_frame,
            frames,
        }
        .into());
    }

    let tree = motion.tree();
    let mut offsets: HashMap<String, Vector3<f64>> = HashMap::with_capacity(tree.len());
    let mut warnings = Vec::new();

    for node in tree.iter_preorder() {
        let name = node.name();
        let Some(parent) = node.parent() else {
            // The root has no bone; its offset is its observed placement.
            match motion.positions(name) {
                Ok(track) => {
                    offsets.insert(name.to_string(), track[reference_frame].coords);
                }
                Err(_) => warnings.push(ConversionWarning::new(
                    WarningCode::CalibrationFallback,
                    name,
                    "no observed positions for the root, kept nominal offset",
                )),
            }
            continue;
        };

        let (Ok(joint_track), Ok(parent_track)) = (motion.positions(name), motion.positions(parent))
        else {
            warnings.push(ConversionWarning::new(
                WarningCode::CalibrationFallback,
                name,
                "missing observed positions, kept nominal offset",
            ));
            continue;
        };

        let mean_length = joint_track
            .iter()
            .zip(parent_track)
            .map(|(joint, parent)| (joint - parent).norm())
            .sum::<f64>()
            / frames as f64;

        let direction = joint_track[reference_frame] - parent_track[reference_frame];
        let direction_norm = direction.norm();
        if direction_norm <= DIRECTION_EPS {
            warnings.push(ConversionWarning::new(
                WarningCode::CalibrationFallback,
                name,
                "joint collocated with parent at the reference frame, kept nominal offset",
            ));
            continue;
        }

        offsets.insert(name.to_string(), direction / direction_norm * mean_length);
    }

    Ok(CalibrationOutcome {
        tree: tree.with_offsets(&offsets),
        warnings,
    })
}
