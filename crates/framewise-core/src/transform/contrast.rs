//! Linear contrast and brightness adjustment.
//!
//! Formula: `output = clamp(input * alpha + beta, 0, 255)`
//!
//! - `alpha` (gain) > 1 increases contrast, < 1 decreases it
//! - `beta` (bias) > 0 brightens, < 0 darkens
//!
//! Results saturate at 0 and 255 rather than wrapping.

use super::Transform;
use crate::error::MediaError;
use crate::frame::{Dimensions, Frame};

/// Gain and bias applied to every sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contrast {
    pub alpha: f32,
    pub beta: f32,
}

impl Contrast {
    pub fn new(alpha: f32, beta: f32) -> Self {
        Self { alpha, beta }
    }

    /// Check if this is the identity adjustment.
    pub fn is_identity(&self) -> bool {
        self.alpha == 1.0 && self.beta == 0.0
    }
}

impl Transform for Contrast {
    fn output_dimensions(&self, input: Dimensions) -> Result<Dimensions, MediaError> {
        Ok(input)
    }

    fn apply(&self, frame: &Frame) -> Result<Frame, MediaError> {
        if !self.alpha.is_finite() || !self.beta.is_finite() {
            return Err(MediaError::InvalidParameter(format!(
                "contrast alpha/beta must be finite, got {}/{}",
                self.alpha, self.beta
            )));
        }

        let mut out = frame.clone();
        apply_contrast(&mut out.pixels, self.alpha, self.beta);
        Ok(out)
    }
}

/// Apply gain and bias to pixel data in place.
///
/// # Arguments
/// * `pixels` - Pixel samples (any channel layout)
/// * `alpha` - Multiplier for each sample
/// * `beta` - Offset added after multiplication
pub fn apply_contrast(pixels: &mut [u8], alpha: f32, beta: f32) {
    // Early exit if no adjustment
    if alpha == 1.0 && beta == 0.0 {
        return;
    }

    let lut = contrast_lut(alpha, beta);
    for sample in pixels.iter_mut() {
        *sample = lut[*sample as usize];
    }
}

/// Precompute the saturating mapping for all 256 input values.
#[inline]
fn contrast_lut(alpha: f32, beta: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let v = value as f32 * alpha + beta;
        *slot = v.clamp(0.0, 255.0).round() as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let frame = Frame::new(2, 2, (0..12).map(|i| i * 20).collect());
        let contrast = Contrast::new(1.0, 0.0);
        assert!(contrast.is_identity());

        let out = contrast.apply(&frame).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn test_gain_and_bias() {
        let mut pixels = vec![0, 10, 100];
        apply_contrast(&mut pixels, 2.0, 5.0);
        assert_eq!(pixels, vec![5, 25, 205]);
    }

    #[test]
    fn test_bright_values_saturate() {
        // 200 * 1.5 = 300 must clamp, not wrap to 44
        let mut pixels = vec![200, 255, 170];
        apply_contrast(&mut pixels, 1.5, 0.0);
        assert_eq!(pixels, vec![255, 255, 255]);
    }

    #[test]
    fn test_negative_bias_clamps_to_black() {
        let mut pixels = vec![0, 20, 100];
        apply_contrast(&mut pixels, 1.0, -50.0);
        assert_eq!(pixels, vec![0, 0, 50]);
    }

    #[test]
    fn test_black_stays_black_under_gain() {
        let mut pixels = vec![0, 0, 0];
        apply_contrast(&mut pixels, 3.0, 0.0);
        assert_eq!(pixels, vec![0, 0, 0]);
    }

    #[test]
    fn test_fractional_gain_rounds() {
        let mut pixels = vec![3, 5];
        apply_contrast(&mut pixels, 0.5, 0.0);
        assert_eq!(pixels, vec![2, 3]);
    }

    #[test]
    fn test_dimensions_unchanged() {
        let frame = Frame::black(7, 3);
        let out = Contrast::new(1.2, 10.0).apply(&frame).unwrap();
        assert_eq!(out.dimensions(), frame.dimensions());
    }

    #[test]
    fn test_rejects_non_finite() {
        let frame = Frame::black(2, 2);
        assert!(Contrast::new(f32::NAN, 0.0).apply(&frame).is_err());
        assert!(Contrast::new(1.0, f32::INFINITY).apply(&frame).is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
