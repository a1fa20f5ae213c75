//! Region-of-interest cropping.
//!
//! Regions are expressed in source pixel coordinates with the origin at the
//! top-left corner. A region must lie fully inside the frame: nothing is
//! clamped, because a truncated region would give frames of one batch
//! different output sizes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Transform;
use crate::error::MediaError;
use crate::frame::{Dimensions, Frame, CHANNELS};

/// A rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Whether the region is non-empty and fully inside a frame of `bounds`.
    pub fn fits_within(&self, bounds: Dimensions) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        matches!((right, bottom), (Some(r), Some(b)) if r <= bounds.width && b <= bounds.height)
    }

    /// Fail with `InvalidRegion` unless the region fits a frame of `bounds`.
    pub fn validate(&self, bounds: Dimensions) -> Result<(), MediaError> {
        if !self.fits_within(bounds) {
            return Err(MediaError::InvalidRegion {
                region: *self,
                frame: bounds,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

impl FromStr for Region {
    type Err = MediaError;

    /// Parse `x,y,w,h`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MediaError::InvalidParameter(format!("region '{}': {}", s, e)))?;

        match parts.as_slice() {
            [x, y, w, h] => Ok(Region::new(*x, *y, *w, *h)),
            _ => Err(MediaError::InvalidParameter(format!(
                "region '{}': expected x,y,w,h",
                s
            ))),
        }
    }
}

/// Extract `frame[y..y+h, x..x+w]`.
///
/// # Errors
///
/// Returns `MediaError::InvalidRegion` if the region is empty or not fully
/// contained in the frame.
pub fn apply_crop(frame: &Frame, region: Region) -> Result<Frame, MediaError> {
    region.validate(frame.dimensions())?;

    // Fast path: full-frame region returns a clone
    if region.x == 0 && region.y == 0 && region.dimensions() == frame.dimensions() {
        return Ok(frame.clone());
    }

    let row_bytes = region.width as usize * CHANNELS;
    let mut output = Vec::with_capacity(row_bytes * region.height as usize);

    // Copy pixel data row by row
    for y in region.y..region.y + region.height {
        let start = frame.index(region.x, y);
        output.extend_from_slice(&frame.pixels[start..start + row_bytes]);
    }

    Ok(Frame::new(region.width, region.height, output))
}

/// Crop every frame to one fixed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop {
    pub region: Region,
}

impl Crop {
    pub fn new(region: Region) -> Self {
        Self { region }
    }
}

impl Transform for Crop {
    fn output_dimensions(&self, input: Dimensions) -> Result<Dimensions, MediaError> {
        self.region.validate(input)?;
        Ok(self.region.dimensions())
    }

    fn apply(&self, frame: &Frame) -> Result<Frame, MediaError> {
        apply_crop(frame, self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test frame where each pixel has a unique value based on position.
    fn test_frame(width: u32, height: u32) -> Frame {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                // Use position to create unique pixel values
                let v = ((y * width + x) % 256) as u8;
                pixels.push(v); // R
                pixels.push(v); // G
                pixels.push(v); // B
            }
        }
        Frame::new(width, height, pixels)
    }

    #[test]
    fn test_full_crop() {
        let frame = test_frame(100, 100);
        let result = apply_crop(&frame, Region::new(0, 0, 100, 100)).unwrap();

        assert_eq!(result, frame);
    }

    #[test]
    fn test_center_crop() {
        let frame = test_frame(10, 10);
        let result = apply_crop(&frame, Region::new(2, 2, 6, 6)).unwrap();

        assert_eq!(result.width, 6);
        assert_eq!(result.height, 6);

        // First pixel should be from position (2, 2) in the original
        // Value at (2, 2) = (2 * 10 + 2) % 256 = 22
        assert_eq!(result.pixels[0], 22);
    }

    #[test]
    fn test_crop_rectangular() {
        let frame = test_frame(200, 100);
        let result = apply_crop(&frame, Region::new(0, 0, 50, 100)).unwrap();

        assert_eq!(result.width, 50);
        assert_eq!(result.height, 100);
    }

    #[test]
    fn test_crop_rejects_overhanging_region() {
        let frame = test_frame(10, 10);

        // Start at 8 and request 5 - extends past the right edge
        let err = apply_crop(&frame, Region::new(8, 0, 5, 5)).unwrap_err();
        assert!(matches!(err, MediaError::InvalidRegion { .. }));

        assert!(apply_crop(&frame, Region::new(0, 8, 5, 5)).is_err());
    }

    #[test]
    fn test_crop_rejects_empty_region() {
        let frame = test_frame(10, 10);
        assert!(apply_crop(&frame, Region::new(0, 0, 0, 5)).is_err());
        assert!(apply_crop(&frame, Region::new(0, 0, 5, 0)).is_err());
    }

    #[test]
    fn test_crop_rejects_overflowing_region() {
        let frame = test_frame(10, 10);
        assert!(apply_crop(&frame, Region::new(u32::MAX, 0, 2, 2)).is_err());
    }

    #[test]
    fn test_crop_pixel_values_preserved() {
        let frame = test_frame(10, 10);
        let result = apply_crop(&frame, Region::new(3, 3, 4, 4)).unwrap();

        // Value = (3 * 10 + 3) % 256 = 33
        assert_eq!(&result.pixels[0..3], &[33, 33, 33]);
        // Last pixel is (6, 6) = 66
        let last = result.pixels.len() - 3;
        assert_eq!(&result.pixels[last..], &[66, 66, 66]);
    }

    #[test]
    fn test_crop_transform_dimensions() {
        let crop = Crop::new(Region::new(5, 5, 20, 10));
        assert_eq!(
            crop.output_dimensions(Dimensions::new(40, 40)).unwrap(),
            Dimensions::new(20, 10)
        );
        assert!(crop.output_dimensions(Dimensions::new(20, 20)).is_err());
    }

    #[test]
    fn test_region_parse() {
        let region: Region = "10, 20,300,400".parse().unwrap();
        assert_eq!(region, Region::new(10, 20, 300, 400));

        assert!("10,20,300".parse::<Region>().is_err());
        assert!("a,b,c,d".parse::<Region>().is_err());
        assert!("-1,0,5,5".parse::<Region>().is_err());
    }

    #[test]
    fn test_region_display() {
        assert_eq!(Region::new(1, 2, 30, 40).to_string(), "30x40+1+2");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
