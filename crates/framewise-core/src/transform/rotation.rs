//! Rotation with bounding-box expansion and dimension restore.
//!
//! # Algorithm
//!
//! The rotation uses inverse mapping: for each pixel of an expanded canvas
//! that fully contains the rotated frame, we calculate which source position
//! contributes to it and interpolate bilinearly. Canvas pixels that map
//! outside the source are black.
//!
//! For rotation by angle θ about the pixel-center origin (y axis pointing
//! down), the inverse transform is:
//! ```text
//! src_x = (dst_x - dst_cx) * cos(θ) - (dst_y - dst_cy) * sin(θ) + src_cx
//! src_y = (dst_x - dst_cx) * sin(θ) + (dst_y - dst_cy) * cos(θ) + src_cy
//! ```
//!
//! The canvas is then resampled back to the source dimensions so every
//! rotated frame of a video has the geometry its encoder was opened with.
//! Detail gained by the larger canvas is lost in that down-sample.

use super::resize::resample;
use super::Transform;
use crate::error::MediaError;
use crate::frame::{Dimensions, FilterType, Frame, CHANNELS};

/// Rotate frames about their center, keeping the input dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotate {
    /// Rotation angle in degrees (positive = counter-clockwise).
    pub angle_degrees: f64,
    /// Filter for the canvas-to-frame down-sample.
    pub filter: FilterType,
}

impl Rotate {
    pub fn new(angle_degrees: f64, filter: FilterType) -> Self {
        Self {
            angle_degrees,
            filter,
        }
    }
}

impl Transform for Rotate {
    fn output_dimensions(&self, input: Dimensions) -> Result<Dimensions, MediaError> {
        Ok(input)
    }

    fn apply(&self, frame: &Frame) -> Result<Frame, MediaError> {
        apply_rotation(frame, self.angle_degrees, self.filter)
    }
}

/// Compute the dimensions of the bounding box for a rotated frame.
///
/// When a frame is rotated, the corners extend beyond the original bounds.
/// This function calculates the minimum bounding box that contains the
/// entire rotated frame:
///
/// ```text
/// bound_w = h*|sin| + w*|cos|
/// bound_h = h*|cos| + w*|sin|
/// ```
///
/// # Arguments
///
/// * `width` - Original frame width
/// * `height` - Original frame height
/// * `angle_degrees` - Rotation angle in degrees (positive = counter-clockwise)
///
/// # Returns
///
/// Tuple of (new_width, new_height) for the rotated bounding box.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    // Normalize angle to handle 360, 720, etc.
    let angle_normalized = angle_degrees % 360.0;
    let abs_angle = angle_normalized.abs();

    // Fast path: no rotation needed (including near-zero and multiples of 360)
    if abs_angle < 0.001 || (360.0 - abs_angle).abs() < 0.001 {
        return (width, height);
    }

    // Fast path: exact 90/270 degree rotations (swap dimensions)
    if (abs_angle - 90.0).abs() < 0.001 || (abs_angle - 270.0).abs() < 0.001 {
        return (height, width);
    }

    // Fast path: exact 180 degree rotation (same dimensions)
    if (abs_angle - 180.0).abs() < 0.001 {
        return (width, height);
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    let new_w = (h * sin + w * cos).round() as u32;
    let new_h = (h * cos + w * sin).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Rotate a frame into an expanded canvas.
///
/// The frame is rotated around its center and the canvas is enlarged to fit
/// the entire rotated frame (no clipping). The dimensions may differ from
/// the source.
pub fn rotate_expanded(frame: &Frame, angle_degrees: f64) -> Frame {
    // Fast path: no rotation needed
    if angle_degrees.abs() < 0.001 || frame.is_empty() {
        return frame.clone();
    }

    let (dst_w, dst_h) = compute_rotated_bounds(frame.width, frame.height, angle_degrees);

    // Rows grow downward, so inverse-mapping through +θ gives a
    // counter-clockwise visual rotation
    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    // Pixel-center origins of source and canvas
    let src_cx = (frame.width as f64 - 1.0) / 2.0;
    let src_cy = (frame.height as f64 - 1.0) / 2.0;
    let dst_cx = (dst_w as f64 - 1.0) / 2.0;
    let dst_cy = (dst_h as f64 - 1.0) / 2.0;

    let mut output = vec![0u8; dst_w as usize * dst_h as usize * CHANNELS];

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            let dx = dst_x as f64 - dst_cx;
            let dy = dst_y as f64 - dst_cy;

            let src_x = dx * cos - dy * sin + src_cx;
            let src_y = dx * sin + dy * cos + src_cy;

            let dst_idx = (dst_y as usize * dst_w as usize + dst_x as usize) * CHANNELS;
            let pixel = sample_bilinear(frame, src_x, src_y);
            output[dst_idx..dst_idx + CHANNELS].copy_from_slice(&pixel);
        }
    }

    Frame::new(dst_w, dst_h, output)
}

/// Rotate a frame and resample the expanded canvas back to the input size.
///
/// # Errors
///
/// Returns `MediaError::InvalidParameter` for a non-finite angle.
pub fn apply_rotation(
    frame: &Frame,
    angle_degrees: f64,
    filter: FilterType,
) -> Result<Frame, MediaError> {
    if !angle_degrees.is_finite() {
        return Err(MediaError::InvalidParameter(format!(
            "rotation angle must be finite, got {}",
            angle_degrees
        )));
    }
    if frame.is_empty() {
        return Ok(frame.clone());
    }

    let canvas = rotate_expanded(frame, angle_degrees);
    resample(&canvas, frame.dimensions(), filter)
}

/// Get a pixel as [f64; 3].
#[inline]
fn get_pixel_f64(frame: &Frame, px: u32, py: u32) -> [f64; 3] {
    let [r, g, b] = frame.pixel(px, py);
    [r as f64, g as f64, b as f64]
}

/// Sample a pixel using bilinear interpolation.
///
/// Positions within half a pixel of the frame edge sample the edge pixels;
/// anything further out is black.
fn sample_bilinear(frame: &Frame, x: f64, y: f64) -> [u8; 3] {
    let (w, h) = (frame.width as f64, frame.height as f64);

    if x < -0.5 || x > w - 0.5 || y < -0.5 || y > h - 0.5 {
        return [0, 0, 0];
    }

    let x = x.clamp(0.0, w - 1.0);
    let y = y.clamp(0.0, h - 1.0);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(frame.width - 1);
    let y1 = (y0 + 1).min(frame.height - 1);

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_pixel_f64(frame, x0, y0);
    let p10 = get_pixel_f64(frame, x1, y0);
    let p01 = get_pixel_f64(frame, x0, y1);
    let p11 = get_pixel_f64(frame, x1, y1);

    let mut result = [0u8; 3];
    for i in 0..3 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    result
}


// ============================================================================
// Property-Based Tests
// ============================================================================
