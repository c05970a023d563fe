//! Immutable per-frame motion container bound to a kinematic tree.

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::{Point3, UnitQuaternion};

use crate::error::{DataError, Error, NotFoundError};
use crate::kinematic_tree::KinematicTree;

/// Default frame time: 30 fps.
pub const DEFAULT_FRAME_TIME: f64 = 1.0 / 30.0;

/// Immutable carrier of motion data.
///
/// Binds a [`KinematicTree`] to per-joint tracks: an optional global
/// *position* track and/or an optional local *rotation* track per joint, each
/// with one value per frame. A container typically holds either the
/// positional representation (observed capture) or the rotational one (solved
/// animation) - with the root special-cased to carry positions alongside
/// rotations, since BVH needs a root translation track.
///
/// Frame counts are uniform across all tracks; this is validated at
/// construction so per-frame code never re-checks it.
///
/// # Example
///
/// ```
/// use mocapkit_core::{KinematicTree, MotionData, Node};
/// use nalgebra::Point3;
/// use std::sync::Arc;
///
/// let tree = Arc::new(KinematicTree::from_nodes(vec![
///     Node::root("PELVIS"),
///     Node::new("SPINE_NAVEL", "PELVIS"),
/// ])?);
/// let motion = MotionData::builder(tree)
///     .positions("PELVIS", vec![Point3::origin()])
///     .positions("SPINE_NAVEL", vec![Point3::new(0.0, 12.0, 0.0)])
///     .build()?;
/// assert_eq!(motion.frame_count(), 1);
/// # Ok::<(), mocapkit_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MotionData {
    tree: Arc<KinematicTree>,
    positions: HashMap<String, Vec<Point3<f64>>>,
    rotations: HashMap<String, Vec<UnitQuaternion<f64>>>,
    frame_count: usize,
    frame_time: f64,
}

impl MotionData {
    /// Starts building a motion container over the given tree.
    pub fn builder(tree: Arc<KinematicTree>) -> MotionDataBuilder {
        MotionDataBuilder {
            tree,
            positions: HashMap::new(),
            rotations: HashMap::new(),
            frame_time: DEFAULT_FRAME_TIME,
        }
    }

    /// The tree this data is bound to.
    pub fn tree(&self) -> &Arc<KinematicTree> {
        &self.tree
    }

    /// Number of frames in every track.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Seconds per frame.
    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    /// True if the joint carries a position track.
    pub fn has_positions(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// True if the joint carries a rotation track.
    pub fn has_rotations(&self, name: &str) -> bool {
        self.rotations.contains_key(name)
    }

    /// The joint's global position track.
    pub fn positions(&self, name: &str) -> Result<&[Point3<f64>], DataError> {
        self.positions
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| DataError::MissingPositions(name.to_string()))
    }

    /// The joint's local rotation track.
    pub fn rotations(&self, name: &str) -> Result<&[UnitQuaternion<f64>], DataError> {
        self.rotations
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| DataError::MissingRotations(name.to_string()))
    }

    /// Rebinds this data to another tree with the same joint set (e.g. a
    /// calibrated copy of the nominal tree). Tracks are shared, not copied
    /// per-value; the result is a new container.
    pub fn with_tree(&self, tree: Arc<KinematicTree>) -> Result<MotionData, Error> {
        for name in self.positions.keys().chain(self.rotations.keys()) {
            if !tree.contains(name) {
                return Err(NotFoundError(name.clone()).into());
            }
        }
        Ok(MotionData {
            tree,
            positions: self.positions.clone(),
            rotations: self.rotations.clone(),
            frame_count: self.frame_count,
            frame_time: self.frame_time,
        })
    }
}

/// Builder for [`MotionData`]; validation happens in [`build`](Self::build).
pub struct MotionDataBuilder {
    tree: Arc<KinematicTree>,
    positions: HashMap<String, Vec<Point3<f64>>>,
    rotations: HashMap<String, Vec<UnitQuaternion<f64>>>,
    frame_time: f64,
}

impl MotionDataBuilder {
    /// Adds a global position track for a joint.
    pub fn positions(mut self, name: impl Into<String>, track: Vec<Point3<f64>>) -> Self {
        self.positions.insert(name.into(), track);
        self
    }

    /// Adds a local rotation track for a joint.
    pub fn rotations(mut self, name: impl Into<String>, track: Vec<UnitQuaternion<f64>>) -> Self {
        self.rotations.insert(name.into(), track);
        self
    }

    /// Adds every position track from the given map.
    pub fn all_positions(mut self, tracks: HashMap<String, Vec<Point3<f64>>>) -> Self {
        self.positions.extend(tracks);
        self
    }

    /// Adds every rotation track from the given map.
    pub fn all_rotations(mut self, tracks: HashMap<String, Vec<UnitQuaternion<f64>>>) -> Self {
        self.rotations.extend(tracks);
        self
    }

    /// Sets the seconds-per-frame duration (default 1/30).
    pub fn frame_time(mut self, frame_time: f64) -> Self {
        self.frame_time = frame_time;
        self
    }

    /// Validates and builds the container.
    ///
    /// Fails with [`NotFoundError`] if a track names a joint missing from the
    /// tree, or [`DataError`] if frame counts disagree or the frame time is
    /// not positive. Validation happens here, before any per-frame work
    /// downstream.
    pub fn build(self) -> Result<MotionData, Error> {
        if !(self.frame_time > 0.0) {
            return Err(DataError::InvalidFrameTime(self.frame_time).into());
        }
        for name in self.positions.keys().chain(self.rotations.keys()) {
            if !self.tree.contains(name) {
                return Err(NotFoundError(name.clone()).into());
            }
        }

        let mut frame_count: Option<(usize, &str)> = None;
        let track_lengths = self
            .positions
            .iter()
            .map(|(name, track)| (name.as_str(), track.len()))
            .chain(
                self.rotations
                    .iter()
                    .map(|(name, track)| (name.as_str(), track.len())),
            );
        for (name, len) in track_lengths {
            match frame_count {
                None => frame_count = Some((len, name)),
                Some((expected, _)) if expected != len => {
                    return Err(DataError::FrameCountMismatch {
                        node: name.to_string(),
                        got: len,
                        expected,
                    }
                    .into())
                }
                Some(_) => {}
            }
        }

        Ok(MotionData {
            tree: self.tree,
            frame_count: frame_count.map_or(0, |(len, _)| len),
            positions: self.positions,
            rotations: self.rotations,
            frame_time: self.frame_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn tree() -> Arc<KinematicTree> {
        Arc::new(
            KinematicTree::from_nodes(vec![
                Node::root("PELVIS"),
                Node::new("SPINE_NAVEL", "PELVIS"),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_uniform_frame_count() {
        let motion = MotionData::builder(tree())
            .positions("PELVIS", vec![Point3::origin(); 4])
            .rotations("SPINE_NAVEL", vec![UnitQuaternion::identity(); 4])
            .build()
            .unwrap();
        assert_eq!(motion.frame_count(), 4);
        assert!(motion.has_positions("PELVIS"));
        assert!(!motion.has_positions("SPINE_NAVEL"));
    }

    #[test]
    fn test_frame_count_mismatch_rejected() {
        let err = MotionData::builder(tree())
            .positions("PELVIS", vec![Point3::origin(); 4])
            .positions("SPINE_NAVEL", vec![Point3::origin(); 3])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Data(DataError::FrameCountMismatch { .. })));
    }

    #[test]
    fn test_unknown_joint_rejected() {
        let err = MotionData::builder(tree())
            .positions("GHOST", vec![Point3::origin()])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(NotFoundError(name)) if name == "GHOST"));
    }

    #[test]
    fn test_invalid_frame_time_rejected() {
        let err = MotionData::builder(tree()).frame_time(0.0).build().unwrap_err();
        assert!(matches!(err, Error::Data(DataError::InvalidFrameTime(_))));
    }

    #[test]
    fn test_missing_track_lookup() {
        let motion = MotionData::builder(tree())
            .positions("PELVIS", vec![Point3::origin()])
            .build()
            .unwrap();
        assert!(matches!(
            motion.rotations("PELVIS").unwrap_err(),
            DataError::MissingRotations(name) if name == "PELVIS"
        ));
    }

    #[test]
    fn test_rebind_to_calibrated_tree() {
        let motion = MotionData::builder(tree())
            .positions("PELVIS", vec![Point3::origin()])
            .build()
            .unwrap();
        let rebound = motion.with_tree(tree()).unwrap();
        assert_eq!(rebound.frame_count(), 1);
    }
}
