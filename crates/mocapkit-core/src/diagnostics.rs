//! Non-fatal diagnostics emitted by calibration, solving, and serialization.
//!
//! Conversions never abort on recoverable conditions; they apply a documented
//! fallback and record a warning with a stable code so callers (and the CLI)
//! can report what happened.

use std::fmt;

/// Warning codes for recoverable conversion conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: calibration kept a nominal rest offset for a joint because the
    /// observed data could not produce one.
    CalibrationFallback,
    /// W002: a rotation fit was degenerate; the solver used an arbitrary
    /// perpendicular axis or held the previous frame's rotation.
    DegenerateRotation,
    /// W003: an orientation was decomposed near gimbal lock; the branch
    /// nearest the previous frame's angles was chosen.
    GimbalLock,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::CalibrationFallback => "W001",
            WarningCode::DegenerateRotation => "W002",
            WarningCode::GimbalLock => "W003",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A recoverable conversion warning with code, message, and the joint (and
/// optionally frame) it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable description of what happened and which fallback ran.
    pub message: String,
    /// The joint the warning applies to.
    pub node: String,
    /// The frame the warning applies to, when frame-specific.
    pub frame: Option<usize>,
}

impl ConversionWarning {
    /// Creates a warning that applies to a joint as a whole.
    pub fn new(code: WarningCode, node: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            node: node.into(),
            frame: None,
        }
    }

    /// Creates a warning pinned to a specific frame.
    pub fn at_frame(
        code: WarningCode,
        node: impl Into<String>,
        frame: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            node: node.into(),
            frame: Some(frame),
        }
    }
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.frame {
            Some(frame) => write!(
                f,
                "{}: {} (node '{}', frame {})",
                self.code, self.message, self.node, frame
            ),
            None => write!(f, "{}: {} (node '{}')", self.code, self.message, self.node),
        }
    }
}
