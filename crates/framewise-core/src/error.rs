//! Error types for the frame pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::frame::Dimensions;
use crate::transform::Region;

/// Errors raised while opening, transforming or writing media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The file exists but could not be decoded.
    #[error("Unreadable media {}: {reason}", path.display())]
    UnreadableMedia { path: PathBuf, reason: String },

    /// A crop rectangle does not lie fully inside the frame.
    #[error("Invalid region {region}: not contained in a {frame} frame")]
    InvalidRegion { region: Region, frame: Dimensions },

    /// A frame does not match the fixed geometry of the sink it is written to.
    #[error("Dimension mismatch: sink expects {expected}, frame is {actual}")]
    DimensionMismatch {
        expected: Dimensions,
        actual: Dimensions,
    },

    /// The output location already exists.
    #[error("Output already exists: {}", .0.display())]
    OutputCollision(PathBuf),

    /// A transform or run parameter is out of its valid range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The operation cannot be applied to this kind of media.
    #[error("{operation} does not apply to {}", path.display())]
    NotApplicable { path: PathBuf, operation: String },

    /// Encoding or writing an output frame failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Filesystem error.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled between frames.
    #[error("Cancelled")]
    Cancelled,
}

impl MediaError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        MediaError::UnreadableMedia {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MediaError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the batch may skip the failing item and continue.
    ///
    /// Dimension mismatches, output collisions, I/O and encoder failures and
    /// cancellation abort the whole run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MediaError::UnreadableMedia { .. }
                | MediaError::InvalidRegion { .. }
                | MediaError::NotApplicable { .. }
        )
    }
}

/// Check a frame against a sink's declared geometry.
pub(crate) fn ensure_dimensions(expected: Dimensions, actual: Dimensions) -> Result<(), MediaError> {
    if expected != actual {
        return Err(MediaError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
