//! Min-max normalization of sample intensities.
//!
//! Each channel (or the whole frame, per [`NormalizeScope`]) is remapped so
//! the observed minimum becomes 0 and the observed maximum becomes 255:
//!
//! ```text
//! out = (in - min) / (max - min) * 255
//! ```
//!
//! A flat channel (max == min) maps to all zeros.

use serde::{Deserialize, Serialize};

use super::Transform;
use crate::error::MediaError;
use crate::frame::{Dimensions, Frame, CHANNELS};

/// Which samples share one min/max range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizeScope {
    /// Each of R, G, B is stretched independently.
    #[default]
    PerChannel,
    /// One range over every sample of the frame.
    Global,
}

/// Observed value range of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    pub min: u8,
    pub max: u8,
}

impl SampleRange {
    fn empty() -> Self {
        Self { min: 255, max: 0 }
    }

    #[inline]
    fn include(&mut self, value: u8) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn merge(self, other: SampleRange) -> SampleRange {
        SampleRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    fn is_flat(&self) -> bool {
        self.max <= self.min
    }
}

/// Compute the per-channel sample ranges of RGB pixel data.
pub fn channel_ranges(pixels: &[u8]) -> [SampleRange; CHANNELS] {
    let mut ranges = [SampleRange::empty(); CHANNELS];
    for chunk in pixels.chunks_exact(CHANNELS) {
        for (range, &value) in ranges.iter_mut().zip(chunk) {
            range.include(value);
        }
    }
    ranges
}

/// Build the lookup table stretching `range` to 0..=255.
fn stretch_lut(range: SampleRange) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if range.is_flat() {
        return lut;
    }

    let span = (range.max - range.min) as f32;
    for value in range.min..=range.max {
        let v = (value - range.min) as f32 / span * 255.0;
        lut[value as usize] = v.round() as u8;
    }
    lut
}

/// Normalize RGB pixel data in place.
pub fn apply_normalize(pixels: &mut [u8], scope: NormalizeScope) {
    let ranges = channel_ranges(pixels);
    let ranges = match scope {
        NormalizeScope::PerChannel => ranges,
        NormalizeScope::Global => {
            let all = ranges[0].merge(ranges[1]).merge(ranges[2]);
            [all; CHANNELS]
        }
    };

    let luts = ranges.map(stretch_lut);
    for chunk in pixels.chunks_exact_mut(CHANNELS) {
        for (sample, lut) in chunk.iter_mut().zip(&luts) {
            *sample = lut[*sample as usize];
        }
    }
}

/// Min-max normalization transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Normalize {
    pub scope: NormalizeScope,
}

impl Normalize {
    pub fn new(scope: NormalizeScope) -> Self {
        Self { scope }
    }
}

impl Transform for Normalize {
    fn output_dimensions(&self, input: Dimensions) -> Result<Dimensions, MediaError> {
        Ok(input)
    }

    fn apply(&self, frame: &Frame) -> Result<Frame, MediaError> {
        let mut out = frame.clone();
        apply_normalize(&mut out.pixels, self.scope);
        Ok(out)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn pixels_strategy() -> impl Strategy<Value = Vec<u8>> {
        (1usize..=50).prop_flat_map(|n| prop::collection::vec(any::<u8>(), n * 3..=n * 3))
    }

    proptest! {
        /// Property: Each non-flat channel's min maps to 0 and max to 255 exactly.
        #[test]
        fn prop_extremes_map_exactly(pixels in pixels_strategy()) {
            let before = channel_ranges(&pixels);
            let mut out = pixels.clone();
            apply_normalize(&mut out, NormalizeScope::PerChannel);
            let after = channel_ranges(&out);

            for c in 0..CHANNELS {
                if before[c].is_flat() {
                    prop_assert_eq!(after[c], SampleRange { min: 0, max: 0 });
                } else {
                    prop_assert_eq!(after[c], SampleRange { min: 0, max: 255 });
                }
            }
        }

        /// Property: Normalization preserves sample ordering within a channel.
        #[test]
        fn prop_order_preserving(pixels in pixels_strategy()) {
            let mut out = pixels.clone();
            apply_normalize(&mut out, NormalizeScope::Global);

            for i in 0..pixels.len() {
                for j in 0..pixels.len() {
                    if pixels[i] < pixels[j] {
                        prop_assert!(out[i] <= out[j]);
                    }
                }
            }
        }
    }
}
