//! The canonical capture document the CLI consumes.
//!
//! Vendor-specific capture files are converted to this shape by external
//! adapters; the CLI only ever sees joint-name-to-positions mappings.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use mocapkit_core::DEFAULT_FRAME_TIME;

fn default_frame_time() -> f64 {
    DEFAULT_FRAME_TIME
}

/// A capture: per-joint global positions, one triple per frame.
///
/// ```json
/// {
///   "frame_time": 0.033333,
///   "positions": {
///     "PELVIS": [[0.0, 90.0, 0.0], [0.1, 90.2, 0.0]],
///     "SPINE_NAVEL": [[0.0, 105.0, 0.0], [0.1, 105.1, 0.0]]
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureDocument {
    /// Seconds per frame; defaults to 1/30.
    #[serde(default = "default_frame_time")]
    pub frame_time: f64,
    /// Joint name to per-frame global positions.
    pub positions: HashMap<String, Vec<[f64; 3]>>,
}

impl CaptureDocument {
    /// Reads and parses a capture document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read capture file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse capture file {}", path.display()))
    }

    /// Number of frames in the longest track (0 if empty).
    pub fn frame_count(&self) -> usize {
        self.positions.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Converts the raw triples into position tracks.
    pub fn tracks(&self) -> HashMap<String, Vec<Point3<f64>>> {
        self.positions
            .iter()
            .map(|(name, track)| {
                let points = track
                    .iter()
                    .map(|&[x, y, z]| Point3::new(x, y, z))
                    .collect();
                (name.clone(), points)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_capture_document() {
        let json = r#"{
            "positions": {
                "PELVIS": [[0.0, 90.0, 0.0], [0.1, 90.2, 0.0]]
            }
        }"#;
        let doc: CaptureDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.frame_count(), 2);
        assert_eq!(doc.frame_time, DEFAULT_FRAME_TIME);
        assert_eq!(doc.tracks()["PELVIS"][1], Point3::new(0.1, 90.2, 0.0));
    }
}
