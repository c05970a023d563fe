//! The position-to-rotation solver: recover per-joint local rotations from
//! observed global joint positions.

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::{UnitQuaternion, Vector3};

use mocapkit_core::{
    ConversionWarning, Error, KinematicTree, MotionData, WarningCode,
};

use crate::align::{fit_bundle, fit_pair, DIRECTION_EPS};

/// Result of solving: the rotational motion plus any degeneracy warnings.
#[derive(Debug)]
pub struct SolveOutcome {
    /// Rotational motion over the input tree. Every joint carries a local
    /// rotation track; the root additionally keeps its observed global
    /// position track, since BVH needs a root translation channel.
    pub motion: MotionData,
    /// Non-fatal [`WarningCode::DegenerateRotation`] diagnostics.
    pub warnings: Vec<ConversionWarning>,
}

/// Computes, for every joint and frame, the local rotation that best
/// reproduces the observed child positions when applied to the calibrated
/// rest offsets.
///
/// Joints are processed in tree pre-order, each frame carrying a
/// world-to-parent-frame accumulator down the recursion, so a joint's local
/// rotation is always fit in the frame its parent already established:
///
/// - a joint with one usable child gets the minimal-angle rotation aligning
///   the child's rest direction with its observed direction;
/// - a joint with several usable children gets the least-squares bundle fit
///   over all of them, which also pins down twist about the joint's own bone
///   axis (and covers the multi-child root);
/// - leaves get the identity: their orientation is unobservable from
///   positions alone.
///
/// Degenerate directions (zero-length rest offset, or collocated joints in a
/// frame) are excluded from the fit. A joint whose every direction is
/// degenerate in some frame holds its previous frame's rotation (identity at
/// frame 0) instead of snapping, reported as a non-fatal
/// [`DegenerateRotation`](WarningCode::DegenerateRotation) warning.
///
/// Fails fast with [`DataError::MissingPositions`](mocapkit_core::DataError)
/// if any joint of the tree lacks a position track, before any per-frame
/// work.
pub fn pos2rot(motion: &MotionData) -> Result<SolveOutcome, Error> {
    let tree = motion.tree();
    for node in tree.nodes() {
        // The solver assumes the full joint set is observed every frame.
        motion.positions(node.name())?;
    }

    let mut solver = Solver {
        tree: tree.as_ref(),
        motion,
        frames: motion.frame_count(),
        rotations: HashMap::with_capacity(tree.len()),
        warnings: Vec::new(),
    };
    let root = tree.root().name().to_string();
    let identity = vec![UnitQuaternion::identity(); solver.frames];
    solver.solve_joint(&root, &identity)?;

    let Solver {
        rotations, warnings, ..
    } = solver;

    let motion = MotionData::builder(Arc::clone(tree))
        .all_rotations(rotations)
        .positions(root.clone(), motion.positions(&root)?.to_vec())
        .frame_time(motion.frame_time())
        .build()?;

    Ok(SolveOutcome { motion, warnings })
}

struct Solver<'a> {
    tree: &'a KinematicTree,
    motion: &'a MotionData,
    frames: usize,
    rotations: HashMap<String, Vec<UnitQuaternion<f64>>>,
    warnings: Vec<ConversionWarning>,
}

impl Solver<'_> {
    /// Solves one joint's track, then recurses into its children with the
    /// accumulator advanced by this joint's local rotation.
    ///
    /// `world_to_parent[f]` maps world vectors into the frame the joint's
    /// local rotation is defined in (the composed inverse of every ancestor
    /// rotation at frame `f`).
    fn solve_joint(
        &mut self,
        name: &str,
        world_to_parent: &[UnitQuaternion<f64>],
    ) -> Result<(), Error> {
        let children = self.tree.children(name)?.to_vec();

        if children.is_empty() {
            self.rotations
                .insert(name.to_string(), vec![UnitQuaternion::identity(); self.frames]);
            return Ok(());
        }

        // Rest directions are fixed per joint; collect the usable ones once.
        let mut rest_directions: Vec<(String, Vector3<f64>)> = Vec::with_capacity(children.len());
        for child in &children {
            let offset = self.tree.node(child)?.offset();
            let norm = offset.norm();
            if norm > DIRECTION_EPS {
                rest_directions.push((child.clone(), offset / norm));
            }
        }

        let track = if rest_directions.is_empty() {
            // No child constrains this joint at all (all rest offsets are
            // zero length, e.g. an uncalibrated end effector chain).
            self.warnings.push(ConversionWarning::new(
                WarningCode::DegenerateRotation,
                name,
                "all child rest offsets are zero length; rotation left at identity",
            ));
            vec![UnitQuaternion::identity(); self.frames]
        } else {
            self.solve_track(name, world_to_parent, &rest_directions)?
        };

        for child in &children {
            let world_to_child: Vec<UnitQuaternion<f64>> = track
                .iter()
                .zip(world_to_parent)
                .map(|(local, accum)| local.inverse() * accum)
                .collect();
            self.solve_joint(child, &world_to_child)?;
        }

        self.rotations.insert(name.to_string(), track);
        Ok(())
    }

    fn solve_track(
        &mut self,
        name: &str,
        world_to_parent: &[UnitQuaternion<f64>],
        rest_directions: &[(String, Vector3<f64>)],
    ) -> Result<Vec<UnitQuaternion<f64>>, Error> {
        let joint_track = self.motion.positions(name)?;
        let mut track: Vec<UnitQuaternion<f64>> = Vec::with_capacity(self.frames);

        for frame in 0..self.frames {
            let mut pairs: Vec<(Vector3<f64>, Vector3<f64>)> =
                Vec::with_capacity(rest_directions.len());
            for (child, rest) in rest_directions {
                let observed_world =
                    self.motion.positions(child)?[frame] - joint_track[frame];
                let observed = world_to_parent[frame] * observed_world;
                let norm = observed.norm();
                if norm > DIRECTION_EPS {
                    pairs.push((*rest, observed / norm));
                }
            }

            let local = match pairs.as_slice() {
                [] => {
                    // Sensor dropout or collocated joints this frame: hold
                    // the previous rotation rather than snapping to identity.
                    self.warnings.push(ConversionWarning::at_frame(
                        WarningCode::DegenerateRotation,
                        name,
                        frame,
                        "all observed directions degenerate; held previous rotation",
                    ));
                    track.last().copied().unwrap_or_else(UnitQuaternion::identity)
                }
                [(rest, observed)] => {
                    let fit = fit_pair(rest, observed);
                    if fit.antiparallel {
                        self.warnings.push(ConversionWarning::at_frame(
                            WarningCode::DegenerateRotation,
                            name,
                            frame,
                            "anti-parallel directions; rotation axis chosen arbitrarily",
                        ));
                    }
                    fit.rotation
                }
                bundle => match fit_bundle(bundle) {
                    Some(rotation) => rotation,
                    None => {
                        self.warnings.push(ConversionWarning::at_frame(
                            WarningCode::DegenerateRotation,
                            name,
                            frame,
                            "bundle fit did not converge; held previous rotation",
                        ));
                        track.last().copied().unwrap_or_else(UnitQuaternion::identity)
                    }
                },
            };
            track.push(local);
        }

        Ok(track)
    }
}
