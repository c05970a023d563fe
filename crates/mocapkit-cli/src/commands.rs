//! Command implementations for the mocapkit CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;

use mocapkit_bvh::save_bvh;
use mocapkit_core::{device, ConversionWarning, KinematicTree, MotionData};
use mocapkit_solve::{adjust_kinematic_tree, pos2rot};

use crate::input::CaptureDocument;

/// Device topologies the CLI knows out of the box.
pub const KNOWN_DEVICES: &[&str] = &["azure-kinect"];

/// Resolves the nominal tree: either a built-in device or a topology file.
pub fn resolve_topology(device: &str, topology: Option<&Path>) -> anyhow::Result<KinematicTree> {
    if let Some(path) = topology {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read topology file {}", path.display()))?;
        let config: device::TopologyConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse topology file {}", path.display()))?;
        return config
            .into_tree()
            .with_context(|| format!("invalid topology in {}", path.display()));
    }
    match device {
        "azure-kinect" => Ok(device::azure_kinect_tree()),
        other => bail!("unknown device '{other}' (known: {})", KNOWN_DEVICES.join(", ")),
    }
}

/// Converts a canonical capture document to a BVH file.
pub fn convert(
    input: &Path,
    output: &Path,
    device_name: &str,
    topology: Option<&Path>,
    fps: Option<f64>,
    calibration_frame: usize,
) -> anyhow::Result<()> {
    let document = CaptureDocument::load(input)?;
    let tree = Arc::new(resolve_topology(device_name, topology)?);

    let frame_time = match fps {
        Some(fps) if fps > 0.0 => 1.0 / fps,
        Some(fps) => bail!("fps must be positive, got {fps}"),
        None => document.frame_time,
    };

    let observed = MotionData::builder(Arc::clone(&tree))
        .all_positions(document.tracks())
        .frame_time(frame_time)
        .build()
        .context("capture does not fit the device topology")?;

    let calibration = adjust_kinematic_tree(&observed, calibration_frame)
        .context("rest-pose calibration failed")?;
    report_warnings(&calibration.warnings);

    let calibrated = Arc::new(calibration.tree);
    let observed = observed.with_tree(Arc::clone(&calibrated))?;

    let solved = pos2rot(&observed).context("rotation solving failed")?;
    report_warnings(&solved.warnings);

    let bvh_warnings = save_bvh(&calibrated, &solved.motion, output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    report_warnings(&bvh_warnings);

    println!(
        "{} {} ({} joints, {} frames)",
        "Wrote".green().bold(),
        output.display(),
        calibrated.len(),
        solved.motion.frame_count(),
    );
    Ok(())
}

/// Prints a summary of a capture document.
pub fn info(input: &Path) -> anyhow::Result<()> {
    let document = CaptureDocument::load(input)?;
    println!("{}", input.display().to_string().bold());
    println!("  frames:     {}", document.frame_count());
    println!("  frame time: {:.6} s", document.frame_time);
    println!("  joints:     {}", document.positions.len());

    let mut names: Vec<&String> = document.positions.keys().collect();
    names.sort();
    for name in names {
        let frames = document.positions[name].len();
        if frames == document.frame_count() {
            println!("    {name}");
        } else {
            println!(
                "    {name} {}",
                format!("({frames} frames, expected {})", document.frame_count()).yellow()
            );
        }
    }
    Ok(())
}

fn report_warnings(warnings: &[ConversionWarning]) {
    for warning in warnings {
        eprintln!("{}", warning.to_string().yellow());
    }
}

/// Output path helper: default to the input name with a `.bvh` extension.
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension("bvh")
}
