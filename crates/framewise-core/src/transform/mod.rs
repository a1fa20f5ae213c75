//! Per-frame transforms.
//!
//! Every transform maps one frame to one new frame and never touches its
//! input. A transform also reports the output size for a given input size,
//! which is how the pipeline sizes a video encoder before the first frame
//! is written.
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = counter-clockwise
//! - Crop regions are in source pixel coordinates
//! - Origin is top-left corner

mod contrast;
mod crop;
mod normalize;
mod resize;
mod rotation;

pub use contrast::{apply_contrast, Contrast};
pub use crop::{apply_crop, Crop, Region};
pub use normalize::{apply_normalize, channel_ranges, Normalize, NormalizeScope, SampleRange};
pub use resize::{resample, scaled_dimensions, Resize};
pub use rotation::{apply_rotation, compute_rotated_bounds, rotate_expanded, Rotate};

use crate::error::MediaError;
use crate::frame::{Dimensions, Frame};

/// A stateless, deterministic frame-to-frame function.
pub trait Transform: Send + Sync {
    /// Size of the frames `apply` produces for inputs of `input` size.
    fn output_dimensions(&self, input: Dimensions) -> Result<Dimensions, MediaError>;

    /// Produce the transformed frame.
    fn apply(&self, frame: &Frame) -> Result<Frame, MediaError>;
}

/// Passes frames through untouched (trim, frame extraction, assembly).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl Transform for Identity {
    fn output_dimensions(&self, input: Dimensions) -> Result<Dimensions, MediaError> {
        Ok(input)
    }

    fn apply(&self, frame: &Frame) -> Result<Frame, MediaError> {
        Ok(frame.clone())
    }
}
