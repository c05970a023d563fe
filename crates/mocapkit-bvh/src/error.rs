//! Error types for BVH serialization.

use thiserror::Error;

use mocapkit_core::{DataError, NotFoundError, StructuralError};

/// Result type for BVH operations.
pub type BvhResult<T> = Result<T, BvhError>;

/// Errors raised while parsing BVH text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The file has no MOTION section.
    #[error("MOTION section not found in BVH content")]
    MissingMotionSection,

    /// A hierarchy or motion line could not be interpreted.
    #[error("line {line}: {message}")]
    Malformed {
        /// 1-based line number in the input.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The `Frames:` value is not a count.
    #[error("invalid frame count: {0}")]
    InvalidFrameCount(String),

    /// The `Frame Time:` value is not a duration.
    #[error("invalid frame time: {0}")]
    InvalidFrameTime(String),

    /// A motion row does not have one value per declared channel.
    #[error("line {line}: expected {expected} channel values, got {got}")]
    ChannelCountMismatch {
        /// 1-based line number in the input.
        line: usize,
        /// Channels declared in the hierarchy.
        expected: usize,
        /// Values found on the row.
        got: usize,
    },

    /// The number of motion rows disagrees with the declared frame count.
    #[error("frame count mismatch: declared {declared}, got {got} rows")]
    FrameCountMismatch {
        /// Declared by `Frames:`.
        declared: usize,
        /// Rows actually present.
        got: usize,
    },
}

impl ParseError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        ParseError::Malformed {
            line,
            message: message.into(),
        }
    }
}

/// Top-level error type for BVH reading and writing.
#[derive(Debug, Error)]
pub enum BvhError {
    /// Structural, lookup, or data error from the core model.
    #[error(transparent)]
    Core(#[from] mocapkit_core::Error),

    /// A node's rotation channels are not a permutation of the three axes.
    #[error("rotation channels for '{node}' do not form an Euler order")]
    InvalidRotationChannels {
        /// The offending node.
        node: String,
    },

    /// Malformed BVH text.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The destination could not be written or the source could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StructuralError> for BvhError {
    fn from(err: StructuralError) -> Self {
        BvhError::Core(err.into())
    }
}

impl From<NotFoundError> for BvhError {
    fn from(err: NotFoundError) -> Self {
        BvhError::Core(err.into())
    }
}

impl From<DataError> for BvhError {
    fn from(err: DataError) -> Self {
        BvhError::Core(err.into())
    }
}
