//! mocapkit solver
//!
//! Turns observed per-joint global positions into a skeletal animation:
//!
//! - [`adjust_kinematic_tree`] - rest-pose calibration: re-estimate every
//!   bone's rest offset (direction and length) from the observed subject, so
//!   solved rotations do not absorb proportion error as spurious rotation.
//! - [`pos2rot`] - the position-to-rotation solver: per-joint, per-frame
//!   local rotations that best reproduce the observed child positions,
//!   fitted with a minimal-angle rotation (one child) or a least-squares
//!   bundle alignment (several children).
//! - [`rot2pos`] - forward kinematics, the solver's inverse, used to verify
//!   round-trip accuracy.
//!
//! Recoverable conditions (missing calibration data, degenerate directions)
//! never abort a conversion; they fall back as documented on each function
//! and surface as [`ConversionWarning`](mocapkit_core::ConversionWarning)s
//! in the returned outcome.
//!
//! # Example
//!
//! ```
//! use mocapkit_core::{device, MotionData};
//! use mocapkit_solve::{adjust_kinematic_tree, pos2rot};
//! use nalgebra::Point3;
//! use std::sync::Arc;
//!
//! # fn capture() -> std::collections::HashMap<String, Vec<Point3<f64>>> {
//! #     let tree = device::azure_kinect_tree();
//! #     tree.nodes()
//! #         .enumerate()
//! #         .map(|(i, n)| (n.name().to_string(), vec![Point3::new(i as f64, 10.0, 0.0)]))
//! #         .collect()
//! # }
//! let tree = Arc::new(device::azure_kinect_tree());
//! let observed = MotionData::builder(tree)
//!     .all_positions(capture())
//!     .build()?;
//!
//! let calibration = adjust_kinematic_tree(&observed, 0)?;
//! let observed = observed.with_tree(Arc::new(calibration.tree))?;
//! let solved = pos2rot(&observed)?;
//! assert_eq!(solved.motion.frame_count(), observed.frame_count());
//! # Ok::<(), mocapkit_core::Error>(())
//! ```

pub mod align;
mod calibrate;
mod pos2rot;
mod rot2pos;

pub use calibrate::{adjust_kinematic_tree, CalibrationOutcome};
pub use pos2rot::{pos2rot, SolveOutcome};
pub use rot2pos::rot2pos;
