//! BVH parsing: text back into a kinematic tree and motion data.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use nalgebra::{Point3, UnitQuaternion, Vector3};

use mocapkit_core::{KinematicTree, MotionData, Node};

use crate::error::{BvhResult, ParseError};
use crate::euler::euler_to_quat;
use crate::layout::ChannelLayout;
use crate::types::Channel;

/// A parsed BVH document.
#[derive(Debug)]
pub struct LoadedBvh {
    /// The motion data, bound to the parsed tree.
    pub motion: MotionData,
    /// Channel layout per channel-bearing node, in hierarchy order.
    pub layouts: IndexMap<String, ChannelLayout>,
}

/// Reads and parses a BVH file.
pub fn load_bvh(path: impl AsRef<Path>) -> BvhResult<LoadedBvh> {
    parse_bvh(&fs::read_to_string(path)?)
}

/// Parses BVH text.
///
/// The hierarchy block is rebuilt into a validated [`KinematicTree`] (an
/// `End Site` becomes a node named after its parent with an `_EndSite`
/// suffix); euler channel values are composed back into quaternions in each
/// node's declared rotation order. Malformed text fails with a
/// [`ParseError`] carrying the offending line.
pub fn parse_bvh(content: &str) -> BvhResult<LoadedBvh> {
    // Keep 1-based line numbers through the trim/skip pass for errors.
    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    let motion_start = lines
        .iter()
        .position(|(_, line)| *line == "MOTION")
        .ok_or(ParseError::MissingMotionSection)?;

    let (nodes, layouts) = parse_hierarchy(&lines[..motion_start])?;
    let tree = KinematicTree::from_nodes(nodes)?;
    parse_motion(tree, layouts, &lines[motion_start + 1..])
}

fn parse_hierarchy(
    lines: &[(usize, &str)],
) -> Result<(Vec<Node>, IndexMap<String, ChannelLayout>), ParseError> {
    let mut nodes: Vec<Node> = Vec::new();
    let mut layouts: IndexMap<String, ChannelLayout> = IndexMap::new();
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for &(line_no, line) in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["ROOT" | "JOINT" | "End", ..] => {
                let node = parse_node_declaration(line_no, &tokens, current.as_deref())?;
                stack.push(node.name().to_string());
                current = Some(node.name().to_string());
                nodes.push(node);
            }
            ["OFFSET", rest @ ..] => {
                if current.is_none() {
                    return Err(ParseError::malformed(
                        line_no,
                        "OFFSET specified before any node declaration",
                    ));
                }
                let offset = parse_offset(line_no, rest)?;
                let node = nodes.pop().ok_or_else(|| {
                    ParseError::malformed(line_no, "OFFSET specified before any node declaration")
                })?;
                nodes.push(node.with_offset(offset));
            }
            ["CHANNELS", ..] => {
                let Some(name) = current.clone() else {
                    return Err(ParseError::malformed(
                        line_no,
                        "CHANNELS specified before any node declaration",
                    ));
                };
                layouts.insert(name, parse_channels(line_no, &tokens)?);
            }
            ["}"] => {
                if stack.pop().is_none() {
                    return Err(ParseError::malformed(
                        line_no,
                        "'}' without a matching node declaration",
                    ));
                }
                current = stack.last().cloned();
            }
            _ => {} // "{", "HIERARCHY", and anything else structural
        }
    }

    Ok((nodes, layouts))
}

fn parse_node_declaration(
    line_no: usize,
    tokens: &[&str],
    current: Option<&str>,
) -> Result<Node, ParseError> {
    let [keyword, name, ..] = tokens else {
        return Err(ParseError::malformed(line_no, "node declaration without a name"));
    };
    match (*keyword, current) {
        ("ROOT", Some(_)) => Err(ParseError::malformed(line_no, "multiple ROOT nodes")),
        ("ROOT", None) => Ok(Node::root(*name)),
        ("JOINT", None) => Err(ParseError::malformed(line_no, "JOINT declared before ROOT")),
        ("JOINT", Some(parent)) => Ok(Node::new(*name, parent)),
        ("End", None) => Err(ParseError::malformed(line_no, "End Site declared before ROOT")),
        ("End", Some(parent)) => {
            if *name != "Site" {
                return Err(ParseError::malformed(
                    line_no,
                    format!("\"End {name}\" is not a valid node type (expected \"End Site\")"),
                ));
            }
            Ok(Node::new(format!("{parent}_EndSite"), parent))
        }
        _ => Err(ParseError::malformed(line_no, "unknown node keyword")),
    }
}

fn parse_offset(line_no: usize, tokens: &[&str]) -> Result<Vector3<f64>, ParseError> {
    let parsed: Result<Vec<f64>, _> = tokens.iter().map(|t| t.parse::<f64>()).collect();
    match parsed.as_deref() {
        Ok([x, y, z]) => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(ParseError::malformed(
            line_no,
            format!("invalid OFFSET values: {}", tokens.join(" ")),
        )),
    }
}

fn parse_channels(line_no: usize, tokens: &[&str]) -> Result<ChannelLayout, ParseError> {
    let [_, count, names @ ..] = tokens else {
        return Err(ParseError::malformed(line_no, "CHANNELS without a count"));
    };
    let count: usize = count
        .parse()
        .map_err(|_| ParseError::malformed(line_no, format!("invalid channel count: {count}")))?;
    if names.len() != count {
        return Err(ParseError::malformed(
            line_no,
            format!("channel count mismatch: declared {count}, got {}", names.len()),
        ));
    }
    let channels: Result<Vec<Channel>, ParseError> = names
        .iter()
        .map(|name| {
            Channel::parse(name)
                .ok_or_else(|| ParseError::malformed(line_no, format!("invalid channel: {name}")))
        })
        .collect();
    Ok(ChannelLayout::from_channels(channels?))
}

fn parse_motion(
    tree: KinematicTree,
    layouts: IndexMap<String, ChannelLayout>,
    lines: &[(usize, &str)],
) -> BvhResult<LoadedBvh> {
    let [(_, frames_line), (_, time_line), rows @ ..] = lines else {
        return Err(ParseError::MissingMotionSection.into());
    };

    let frame_count: usize = frames_line
        .strip_prefix("Frames:")
        .map(str::trim)
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| ParseError::InvalidFrameCount(frames_line.to_string()))?;

    let frame_time: f64 = time_line
        .strip_prefix("Frame Time:")
        .map(str::trim)
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| ParseError::InvalidFrameTime(time_line.to_string()))?;

    if rows.len() != frame_count {
        return Err(ParseError::FrameCountMismatch {
            declared: frame_count,
            got: rows.len(),
        }
        .into());
    }

    let expected: usize = layouts.values().map(ChannelLayout::channel_count).sum();

    let mut positions: HashMap<String, Vec<Point3<f64>>> = HashMap::new();
    let mut rotations: HashMap<String, Vec<UnitQuaternion<f64>>> = HashMap::new();
    for (name, layout) in &layouts {
        if layout.has_position_channels() {
            positions.insert(name.clone(), Vec::with_capacity(frame_count));
        }
        if layout.has_rotation_channels() {
            rotations.insert(name.clone(), Vec::with_capacity(frame_count));
        }
    }

    for &(line_no, row) in rows {
        let values: Result<Vec<f64>, _> =
            row.split_whitespace().map(|t| t.parse::<f64>()).collect();
        let values = values
            .map_err(|_| ParseError::malformed(line_no, "invalid motion value"))?;
        if values.len() != expected {
            return Err(ParseError::ChannelCountMismatch {
                line: line_no,
                expected,
                got: values.len(),
            }
            .into());
        }

        let mut cursor = 0;
        for (name, layout) in &layouts {
            let slice = &values[cursor..cursor + layout.channel_count()];
            cursor += layout.channel_count();

            let mut offset = 0;
            if layout.has_position_channels() {
                let mut position = Point3::origin();
                for channel in layout.position_channels() {
                    position[channel.axis()] = slice[offset];
                    offset += 1;
                }
                positions
                    .get_mut(name)
                    .expect("position track preallocated for layout")
                    .push(position);
            }
            if layout.has_rotation_channels() {
                let order = layout.rotation_order().ok_or_else(|| {
                    ParseError::malformed(
                        line_no,
                        format!("rotation channels for '{name}' do not form an Euler order"),
                    )
                })?;
                let angles = [
                    slice[offset].to_radians(),
                    slice[offset + 1].to_radians(),
                    slice[offset + 2].to_radians(),
                ];
                rotations
                    .get_mut(name)
                    .expect("rotation track preallocated for layout")
                    .push(euler_to_quat(order, angles));
            }
        }
    }

    let motion = MotionData::builder(Arc::new(tree))
        .all_positions(positions)
        .all_rotations(rotations)
        .frame_time(frame_time)
        .build()?;

    Ok(LoadedBvh { motion, layouts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RotationOrder;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
HIERARCHY
ROOT Hips
{
  OFFSET 0.000000 0.000000 0.000000
  CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
  JOINT Spine
  {
    OFFSET 0.000000 10.000000 0.000000
    CHANNELS 3 Zrotation Xrotation Yrotation
    End Site
    {
      OFFSET 0.000000 5.000000 0.000000
    }
  }
}
MOTION
Frames: 2
Frame Time: 0.033333
1.0 2.0 3.0 90.0 0.0 0.0 0.0 0.0 0.0
1.5 2.5 3.5 0.0 0.0 45.0 -30.0 0.0 0.0
";

    #[test]
    fn test_parse_sample() {
        let loaded = parse_bvh(SAMPLE).unwrap();
        let motion = &loaded.motion;
        let tree = motion.tree();

        assert_eq!(tree.root().name(), "Hips");
        assert_eq!(tree.children("Spine").unwrap(), &["Spine_EndSite".to_string()]);
        assert_eq!(
            tree.node("Spine_EndSite").unwrap().offset(),
            &Vector3::new(0.0, 5.0, 0.0)
        );

        assert_eq!(motion.frame_count(), 2);
        assert_relative_eq!(motion.frame_time(), 0.033333, epsilon = 1e-9);
        assert_eq!(
            motion.positions("Hips").unwrap()[1],
            Point3::new(1.5, 2.5, 3.5)
        );

        // 90 about z in ZXY order.
        let rotation = motion.rotations("Hips").unwrap()[0];
        let expected =
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(rotation.angle_to(&expected), 0.0, epsilon = 1e-9);

        assert_eq!(loaded.layouts.len(), 2);
        assert_eq!(
            loaded.layouts["Hips"].rotation_order(),
            Some(RotationOrder::Zxy)
        );
        // End sites declare no channels.
        assert!(!loaded.layouts.contains_key("Spine_EndSite"));
    }

    #[test]
    fn test_missing_motion_section() {
        let err = parse_bvh("HIERARCHY\nROOT A\n{\n  OFFSET 0 0 0\n}\n").unwrap_err();
        assert!(matches!(
            err,
            crate::error::BvhError::Parse(ParseError::MissingMotionSection)
        ));
    }

    #[test]
    fn test_multiple_roots_rejected() {
        let content = SAMPLE.replace("JOINT Spine", "ROOT Spine");
        let err = parse_bvh(&content).unwrap_err();
        assert!(matches!(err, crate::error::BvhError::Parse(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_bad_end_site_name_rejected() {
        let content = SAMPLE.replace("End Site", "End Effector");
        let err = parse_bvh(&content).unwrap_err();
        assert!(matches!(err, crate::error::BvhError::Parse(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_row_channel_count_checked() {
        let content = SAMPLE.replace("1.0 2.0 3.0 90.0 0.0 0.0 0.0 0.0 0.0", "1.0 2.0 3.0");
        let err = parse_bvh(&content).unwrap_err();
        assert!(matches!(
            err,
            crate::error::BvhError::Parse(ParseError::ChannelCountMismatch { expected: 9, got: 3, .. })
        ));
    }

    #[test]
    fn test_frame_count_checked() {
        let content = SAMPLE.replace("Frames: 2", "Frames: 3");
        let err = parse_bvh(&content).unwrap_err();
        assert!(matches!(
            err,
            crate::error::BvhError::Parse(ParseError::FrameCountMismatch { declared: 3, got: 2 })
        ));
    }
}
