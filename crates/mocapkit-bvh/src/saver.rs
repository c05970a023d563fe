//! BVH serialization: hierarchy block plus motion block.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, UnitQuaternion, Vector3};

use mocapkit_core::{
    ConversionWarning, KinematicTree, MotionData, Node, StructuralError, WarningCode,
};

use crate::error::{BvhError, BvhResult};
use crate::euler::quat_to_euler;
use crate::layout::ChannelLayout;
use crate::types::RotationOrder;

const INDENT: &str = "  ";

/// Writes `motion` over `tree` as BVH text to a file path.
///
/// See [`write_bvh`] for the serialization contract.
pub fn save_bvh(
    tree: &KinematicTree,
    motion: &MotionData,
    path: impl AsRef<Path>,
) -> BvhResult<Vec<ConversionWarning>> {
    save_bvh_with_layouts(tree, motion, &HashMap::new(), path)
}

/// [`save_bvh`] with explicit per-node channel layouts.
pub fn save_bvh_with_layouts(
    tree: &KinematicTree,
    motion: &MotionData,
    layouts: &HashMap<String, ChannelLayout>,
    path: impl AsRef<Path>,
) -> BvhResult<Vec<ConversionWarning>> {
    let mut writer = BufWriter::new(File::create(path)?);
    let warnings = write_bvh_with_layouts(tree, motion, layouts, &mut writer)?;
    writer.flush()?;
    Ok(warnings)
}

/// Serializes a kinematic tree plus rotational motion data as BVH text.
///
/// The hierarchy block follows the tree's canonical pre-order, so motion
/// columns line up with the declared channels by construction. Per node the
/// default layout applies (root: positions + rotations, others: rotations,
/// order ZXY) unless overridden. Orientations are converted to Euler degrees
/// in each node's declared rotation order; decompositions near gimbal lock
/// pick the branch nearest the previous frame and surface as non-fatal
/// [`GimbalLock`](WarningCode::GimbalLock) warnings in the return value.
///
/// Fails with [`StructuralError::TreeMismatch`] if `motion` is bound to a
/// different tree than `tree`, with `NotFoundError` if a layout override
/// names an unknown node, and with `DataError` if a node's declared channels
/// have no matching track.
pub fn write_bvh<W: Write>(
    tree: &KinematicTree,
    motion: &MotionData,
    writer: &mut W,
) -> BvhResult<Vec<ConversionWarning>> {
    write_bvh_with_layouts(tree, motion, &HashMap::new(), writer)
}

/// [`write_bvh`] with explicit per-node channel layouts.
pub fn write_bvh_with_layouts<W: Write>(
    tree: &KinematicTree,
    motion: &MotionData,
    layouts: &HashMap<String, ChannelLayout>,
    writer: &mut W,
) -> BvhResult<Vec<ConversionWarning>> {
    if motion.tree().as_ref() != tree {
        return Err(StructuralError::TreeMismatch.into());
    }
    for name in layouts.keys() {
        tree.node(name)?;
    }

    let mut node_order: Vec<String> = Vec::with_capacity(tree.len());
    let mut lines = vec!["HIERARCHY".to_string()];
    lines.extend(build_node_lines(tree, tree.root().name(), layouts, &mut node_order)?);

    // Resolve every motion column before writing anything, so a declared
    // channel with no backing track fails without producing a partial file.
    let mut columns = build_columns(motion, &node_order, layouts)?;

    for line in &lines {
        writeln!(writer, "{line}")?;
    }
    writeln!(writer, "MOTION")?;
    writeln!(writer, "Frames: {}", motion.frame_count())?;
    writeln!(writer, "Frame Time: {:.6}", motion.frame_time())?;

    write_motion_rows(motion, &mut columns, writer)
}

fn layout_for(
    tree: &KinematicTree,
    name: &str,
    layouts: &HashMap<String, ChannelLayout>,
) -> ChannelLayout {
    layouts
        .get(name)
        .cloned()
        .unwrap_or_else(|| ChannelLayout::default_for(tree.node(name).map_or(false, Node::is_root)))
}

/// Recursively renders one node and its subtree, recording channel-bearing
/// nodes in `node_order` as they are declared.
fn build_node_lines(
    tree: &KinematicTree,
    name: &str,
    layouts: &HashMap<String, ChannelLayout>,
    node_order: &mut Vec<String>,
) -> BvhResult<Vec<String>> {
    let node = tree.node(name)?;
    let layout = layout_for(tree, name, layouts);
    let children = tree.children(name)?;

    if !children.is_empty() {
        node_order.push(name.to_string());
        let mut child_lines = Vec::new();
        for child in children {
            child_lines.extend(build_node_lines(tree, child, layouts, node_order)?);
        }
        let keyword = if node.is_root() { "ROOT" } else { "JOINT" };
        return Ok(render_block(
            keyword,
            Some(name),
            node.offset(),
            Some(&layout),
            child_lines,
        ));
    }

    if node.is_root() {
        // A childless root still owns channels.
        node_order.push(name.to_string());
        return Ok(render_block("ROOT", Some(name), node.offset(), Some(&layout), Vec::new()));
    }

    if tree.has_siblings(name)? {
        // A childless joint among siblings keeps its name and channels and
        // closes the chain with a zero-offset end site.
        node_order.push(name.to_string());
        let end_site = render_block("End Site", None, &Vector3::zeros(), None, Vec::new());
        return Ok(render_block(
            "JOINT",
            Some(name),
            node.offset(),
            Some(&layout),
            end_site,
        ));
    }

    // A lone childless joint is the end site itself.
    Ok(render_block("End Site", None, node.offset(), None, Vec::new()))
}

fn render_block(
    keyword: &str,
    name: Option<&str>,
    offset: &Vector3<f64>,
    layout: Option<&ChannelLayout>,
    children: Vec<String>,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(children.len() + 4);
    match name {
        Some(name) => lines.push(format!("{keyword} {name}")),
        None => lines.push(keyword.to_string()),
    }
    lines.push("{".to_string());
    lines.push(format!(
        "{INDENT}OFFSET {:.6} {:.6} {:.6}",
        canonical(offset.x),
        canonical(offset.y),
        canonical(offset.z)
    ));
    if let Some(layout) = layout {
        let mut channels = format!("{INDENT}CHANNELS {}", layout.channel_count());
        for channel in layout.channels() {
            let _ = write!(channels, " {channel}");
        }
        lines.push(channels);
    }
    for line in children {
        lines.push(format!("{INDENT}{line}"));
    }
    lines.push("}".to_string());
    lines
}

/// One channel-bearing node's slice of every motion row.
struct Column<'a> {
    name: &'a str,
    layout: ChannelLayout,
    positions: Option<&'a [Point3<f64>]>,
    rotations: Option<(RotationOrder, &'a [UnitQuaternion<f64>])>,
    previous_euler: Option<[f64; 3]>,
}

fn build_columns<'a>(
    motion: &'a MotionData,
    node_order: &'a [String],
    layouts: &HashMap<String, ChannelLayout>,
) -> BvhResult<Vec<Column<'a>>> {
    let tree = motion.tree();
    let mut columns = Vec::with_capacity(node_order.len());
    for name in node_order {
        let layout = layout_for(tree, name, layouts);
        let positions = if layout.has_position_channels() {
            Some(motion.positions(name)?)
        } else {
            None
        };
        let rotations = if layout.has_rotation_channels() {
            let order = layout
                .rotation_order()
                .ok_or_else(|| BvhError::InvalidRotationChannels { node: name.clone() })?;
            Some((order, motion.rotations(name)?))
        } else {
            None
        };
        columns.push(Column {
            name,
            layout,
            positions,
            rotations,
            previous_euler: None,
        });
    }
    Ok(columns)
}

fn write_motion_rows<W: Write>(
    motion: &MotionData,
    columns: &mut [Column<'_>],
    writer: &mut W,
) -> BvhResult<Vec<ConversionWarning>> {
    let mut warnings = Vec::new();
    let mut row = String::new();
    for frame in 0..motion.frame_count() {
        row.clear();
        for column in columns.iter_mut() {
            if let Some(positions) = column.positions {
                let position = positions[frame];
                for channel in column.layout.position_channels() {
                    push_value(&mut row, position[channel.axis()]);
                }
            }
            if let Some((order, rotations)) = column.rotations {
                let decomposed = quat_to_euler(&rotations[frame], order, column.previous_euler);
                if decomposed.near_gimbal {
                    warnings.push(ConversionWarning::at_frame(
                        WarningCode::GimbalLock,
                        column.name,
                        frame,
                        "decomposition near gimbal lock; chose branch nearest previous frame",
                    ));
                }
                column.previous_euler = Some(decomposed.angles);
                for angle in decomposed.angles {
                    push_value(&mut row, angle.to_degrees());
                }
            }
        }
        writeln!(writer, "{}", row.trim_end())?;
    }

    Ok(warnings)
}

fn push_value(row: &mut String, value: f64) {
    let _ = write!(row, "{:.6} ", canonical(value));
}

/// Collapses values that round to zero at the printed precision, so identity
/// channels print as `0.000000` rather than `-0.000000`.
fn canonical(value: f64) -> f64 {
    if value.abs() < 5e-7 {
        0.0
    } else {
        value
    }
}
