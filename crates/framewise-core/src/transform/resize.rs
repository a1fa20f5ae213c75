//! Frame resizing by a uniform scale factor.
//!
//! Uses the `image` crate's resampling filters, which handle both
//! upscaling and downscaling. All functions return new frames without
//! modifying the input.

use super::Transform;
use crate::error::MediaError;
use crate::frame::{Dimensions, FilterType, Frame};

/// Resample a frame to exact dimensions.
///
/// # Errors
///
/// Returns `MediaError::InvalidParameter` if a target dimension is zero.
pub fn resample(frame: &Frame, target: Dimensions, filter: FilterType) -> Result<Frame, MediaError> {
    if target.width == 0 || target.height == 0 {
        return Err(MediaError::InvalidParameter(format!(
            "cannot resample to {}",
            target
        )));
    }

    // Fast path: if dimensions match, just clone
    if frame.dimensions() == target {
        return Ok(frame.clone());
    }

    let rgb_image = frame.to_rgb_image().ok_or_else(|| {
        MediaError::InvalidParameter(format!(
            "pixel buffer of {} bytes does not match {}",
            frame.pixels.len(),
            frame.dimensions()
        ))
    })?;

    let resized = image::imageops::resize(
        &rgb_image,
        target.width,
        target.height,
        filter.to_image_filter(),
    );

    Ok(Frame::from_rgb_image(resized))
}

/// Compute scaled dimensions, rounding down.
///
/// # Errors
///
/// Returns `MediaError::InvalidParameter` if the factor is not a positive
/// finite number or a scaled dimension would be zero.
pub fn scaled_dimensions(input: Dimensions, factor: f64) -> Result<Dimensions, MediaError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(MediaError::InvalidParameter(format!(
            "resize factor must be positive, got {}",
            factor
        )));
    }

    let width = (input.width as f64 * factor).floor();
    let height = (input.height as f64 * factor).floor();

    if width < 1.0 || height < 1.0 || width > u32::MAX as f64 || height > u32::MAX as f64 {
        return Err(MediaError::InvalidParameter(format!(
            "resize factor {} turns {} into {}x{}",
            factor, input, width, height
        )));
    }

    Ok(Dimensions::new(width as u32, height as u32))
}

/// Resize frames to a fixed target size.
///
/// The target is computed once per media item from its declared
/// dimensions, so every frame of a video lands on the same geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub target: Dimensions,
    pub filter: FilterType,
}

impl Resize {
    /// Resize for an item of the given size by `factor`.
    pub fn by_factor(input: Dimensions, factor: f64, filter: FilterType) -> Result<Self, MediaError> {
        Ok(Self {
            target: scaled_dimensions(input, factor)?,
            filter,
        })
    }
}

impl Transform for Resize {
    fn output_dimensions(&self, _input: Dimensions) -> Result<Dimensions, MediaError> {
        Ok(self.target)
    }

    fn apply(&self, frame: &Frame) -> Result<Frame, MediaError> {
        resample(frame, self.target, self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_frame(width: u32, height: u32) -> Frame {
        // Create a simple gradient frame for testing
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8); // R
                pixels.push(((y * 255) / height.max(1)) as u8); // G
                pixels.push(128); // B
            }
        }
        Frame::new(width, height, pixels)
    }

    #[test]
    fn test_resample_basic() {
        let frame = create_test_frame(100, 50);
        let resized = resample(&frame, Dimensions::new(50, 25), FilterType::Bilinear).unwrap();

        assert_eq!(resized.width, 50);
        assert_eq!(resized.height, 25);
        assert_eq!(resized.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_resample_same_dimensions() {
        let frame = create_test_frame(100, 50);
        let resized = resample(&frame, Dimensions::new(100, 50), FilterType::Cubic).unwrap();

        assert_eq!(resized, frame);
    }

    #[test]
    fn test_resample_upscale() {
        let frame = create_test_frame(50, 25);
        let resized = resample(&frame, Dimensions::new(100, 50), FilterType::Lanczos3).unwrap();

        assert_eq!(resized.width, 100);
        assert_eq!(resized.height, 50);
    }

    #[test]
    fn test_resample_zero_dimensions_error() {
        let frame = create_test_frame(100, 50);

        assert!(resample(&frame, Dimensions::new(0, 50), FilterType::Bilinear).is_err());
        assert!(resample(&frame, Dimensions::new(50, 0), FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_scaled_dimensions_floor() {
        let dims = scaled_dimensions(Dimensions::new(101, 51), 0.5).unwrap();
        assert_eq!(dims, Dimensions::new(50, 25));

        let dims = scaled_dimensions(Dimensions::new(640, 480), 1.5).unwrap();
        assert_eq!(dims, Dimensions::new(960, 720));
    }

    #[test]
    fn test_scaled_dimensions_rejects_bad_factor() {
        let input = Dimensions::new(100, 100);
        assert!(scaled_dimensions(input, 0.0).is_err());
        assert!(scaled_dimensions(input, -2.0).is_err());
        assert!(scaled_dimensions(input, f64::NAN).is_err());
        // Collapses to zero width
        assert!(scaled_dimensions(input, 0.001).is_err());
    }

    #[test]
    fn test_resize_transform_uses_fixed_target() {
        let resize =
            Resize::by_factor(Dimensions::new(80, 60), 0.5, FilterType::Cubic).unwrap();
        assert_eq!(
            resize.output_dimensions(Dimensions::new(80, 60)).unwrap(),
            Dimensions::new(40, 30)
        );

        let out = resize.apply(&create_test_frame(80, 60)).unwrap();
        assert_eq!(out.dimensions(), Dimensions::new(40, 30));
    }

    #[test]
    fn test_all_filter_types() {
        let frame = create_test_frame(100, 50);

        for filter in [
            FilterType::Nearest,
            FilterType::Bilinear,
            FilterType::Cubic,
            FilterType::Lanczos3,
        ] {
            let resized = resample(&frame, Dimensions::new(50, 25), filter).unwrap();
            assert_eq!(resized.dimensions(), Dimensions::new(50, 25));
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
