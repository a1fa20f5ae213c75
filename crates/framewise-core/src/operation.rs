//! Batch operations.
//!
//! An [`Operation`] is what a run does to every item: it names the output
//! directory and files, says which media it accepts, and builds the
//! per-item [`Transform`].

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::MediaError;
use crate::frame::{FilterType, Frame};
use crate::media::{MediaItem, MediaKind};
use crate::output::encode_param;
use crate::region::{FixedRegion, RegionSelector};
use crate::transform::{
    Contrast, Crop, Identity, Normalize, NormalizeScope, Region, Resize, Rotate, Transform,
};

/// Largest rotation accepted, in degrees either way.
pub const MAX_ROTATION_DEGREES: f64 = 360.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Operation {
    /// Rotate by `angle` degrees counter-clockwise, keeping the frame size.
    Rotate { angle: f64 },
    /// Scale both sides by `factor`.
    Resize { factor: f64 },
    /// Crop to a region of interest. Without a region, the pipeline needs a
    /// [`RegionSelector`].
    Crop {
        #[serde(default)]
        region: Option<Region>,
    },
    /// `out = clamp(alpha * in + beta)`.
    Contrast {
        alpha: f32,
        #[serde(default)]
        beta: f32,
    },
    /// Min-max stretch to the full 0..=255 range.
    Normalize {
        #[serde(default)]
        scope: NormalizeScope,
    },
    /// Keep video frames `start..=end` (zero-based).
    Trim { start: u64, end: u64 },
    /// Write every video frame as a numbered PNG.
    ExtractFrames,
    /// Join a directory of images into one video at `fps`.
    Assemble { fps: f64 },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Rotate { .. } => "rotate",
            Operation::Resize { .. } => "resize",
            Operation::Crop { .. } => "crop",
            Operation::Contrast { .. } => "contrast",
            Operation::Normalize { .. } => "normalize",
            Operation::Trim { .. } => "trim",
            Operation::ExtractFrames => "extract-frames",
            Operation::Assemble { .. } => "assemble",
        }
    }

    /// Reject out-of-range parameters before anything is written.
    pub fn validate(&self) -> Result<(), MediaError> {
        let invalid = |msg: String| Err(MediaError::InvalidParameter(msg));
        match *self {
            Operation::Rotate { angle } => {
                if !angle.is_finite() || angle.abs() > MAX_ROTATION_DEGREES {
                    return invalid(format!(
                        "rotation angle must be within ±{MAX_ROTATION_DEGREES} degrees, got {angle}"
                    ));
                }
            }
            Operation::Resize { factor } => {
                if !factor.is_finite() || factor <= 0.0 {
                    return invalid(format!("resize factor must be positive, got {factor}"));
                }
            }
            Operation::Crop { region: Some(region) } => {
                if region.width == 0 || region.height == 0 {
                    return invalid(format!("crop region {region} is empty"));
                }
            }
            Operation::Crop { region: None } => {}
            Operation::Contrast { alpha, beta } => {
                if !alpha.is_finite() || !beta.is_finite() {
                    return invalid(format!(
                        "contrast parameters must be finite, got alpha {alpha}, beta {beta}"
                    ));
                }
            }
            Operation::Normalize { .. } | Operation::ExtractFrames => {}
            Operation::Trim { start, end } => {
                if start > end {
                    return invalid(format!("trim start {start} is after end {end}"));
                }
            }
            Operation::Assemble { fps } => {
                if !fps.is_finite() || fps <= 0.0 {
                    return invalid(format!("frame rate must be positive, got {fps}"));
                }
            }
        }
        Ok(())
    }

    /// Output directory name, before the timestamp.
    pub fn dir_label(&self) -> String {
        match self {
            Operation::Rotate { angle } => format!("Rotate {}", encode_param(angle)),
            Operation::Resize { factor } => format!("Resize {}", encode_param(factor)),
            Operation::Crop { .. } => "ROI".to_string(),
            Operation::Contrast { alpha, beta } => {
                format!("Contrast a{}, b{}", encode_param(alpha), encode_param(beta))
            }
            Operation::Normalize { .. } => "Normalized".to_string(),
            Operation::Trim { start, end } => format!("Cropped i{start}, f{end}"),
            Operation::ExtractFrames => "Frames".to_string(),
            Operation::Assemble { fps } => format!("Video, fps {}", encode_param(fps)),
        }
    }

    /// Appended to the input stem to name an output file.
    pub fn file_suffix(&self) -> String {
        match self {
            Operation::Rotate { angle } => format!("_rot_{}", encode_param(angle)),
            Operation::Resize { factor } => format!("_rs_{}", encode_param(factor)),
            Operation::Crop { .. } => "_ROI".to_string(),
            Operation::Contrast { alpha, beta } => {
                format!("_a{}_b{}", encode_param(alpha), encode_param(beta))
            }
            Operation::Normalize { .. } => "_normalized".to_string(),
            Operation::Trim { start, end } => format!("_i{start}_f{end}"),
            Operation::ExtractFrames => "_frame".to_string(),
            Operation::Assemble { fps } => format!("_fps_{}", encode_param(fps)),
        }
    }

    /// Whether discovered media of `kind` is input to this operation.
    pub fn accepts(&self, kind: MediaKind) -> bool {
        match self {
            Operation::Trim { .. } | Operation::ExtractFrames => kind == MediaKind::Video,
            Operation::Assemble { .. } => kind == MediaKind::Image,
            _ => true,
        }
    }

    /// Frame ordinals to keep, when the operation drops frames.
    pub fn frame_range(&self) -> Option<RangeInclusive<u64>> {
        match *self {
            Operation::Trim { start, end } => Some(start..=end),
            _ => None,
        }
    }

    /// Whether frames go to numbered images rather than one file per item.
    pub fn writes_frames(&self) -> bool {
        matches!(self, Operation::ExtractFrames)
    }

    /// Build the transform for one item from its first frame.
    pub fn resolve_transform(
        &self,
        item: &MediaItem,
        first_frame: &Frame,
        selector: Option<&dyn RegionSelector>,
        filter: FilterType,
    ) -> Result<Box<dyn Transform>, MediaError> {
        let transform: Box<dyn Transform> = match *self {
            Operation::Rotate { angle } => Box::new(Rotate::new(angle, filter)),
            Operation::Resize { factor } => {
                // A valid factor can still collapse one small item to nothing
                let dimensions = first_frame.dimensions();
                let resize = Resize::by_factor(dimensions, factor, filter).map_err(|_| {
                    MediaError::NotApplicable {
                        path: item.path().to_path_buf(),
                        operation: format!(
                            "{} (a {} frame shrinks to nothing)",
                            self.dir_label(),
                            dimensions
                        ),
                    }
                })?;
                Box::new(resize)
            }
            Operation::Crop { region } => {
                let region = match (selector, region) {
                    (Some(selector), _) => selector.select(item, first_frame)?,
                    (None, Some(region)) => FixedRegion(region).select(item, first_frame)?,
                    (None, None) => {
                        return Err(MediaError::InvalidParameter(
                            "crop needs a region or a region selector".into(),
                        ))
                    }
                };
                region.validate(first_frame.dimensions())?;
                Box::new(Crop::new(region))
            }
            Operation::Contrast { alpha, beta } => Box::new(Contrast::new(alpha, beta)),
            Operation::Normalize { scope } => Box::new(Normalize::new(scope)),
            Operation::Trim { .. } | Operation::ExtractFrames | Operation::Assemble { .. } => {
                Box::new(Identity)
            }
        };
        Ok(transform)
    }
}
