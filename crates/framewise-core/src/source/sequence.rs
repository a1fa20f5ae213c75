//! An ordered list of image files read as one stream.

use std::path::PathBuf;
use std::vec::IntoIter;

use super::image::decode_image;
use super::FrameSource;
use crate::error::MediaError;
use crate::frame::{Dimensions, Frame};
use crate::media::ImageSequence;

/// Reads images one at a time in order. Every image must match the
/// first image's dimensions.
#[derive(Debug)]
pub struct ImageSequenceSource {
    pending: IntoIter<PathBuf>,
    total: u64,
    fps: f64,
    expected: Option<Dimensions>,
    exhausted: bool,
}

impl ImageSequenceSource {
    pub fn open(seq: &ImageSequence) -> Result<Self, MediaError> {
        if !seq.fps.is_finite() || seq.fps <= 0.0 {
            return Err(MediaError::InvalidParameter(format!(
                "sequence frame rate must be positive, got {}",
                seq.fps
            )));
        }
        Ok(Self {
            pending: seq.frames.clone().into_iter(),
            total: seq.frames.len() as u64,
            fps: seq.fps,
            expected: None,
            exhausted: false,
        })
    }

    fn read_next(&mut self) -> Result<Option<Frame>, MediaError> {
        let Some(path) = self.pending.next() else {
            return Ok(None);
        };

        let frame = decode_image(&path)?;
        match self.expected {
            None => self.expected = Some(frame.dimensions()),
            Some(expected) if expected != frame.dimensions() => {
                return Err(MediaError::unreadable(
                    &path,
                    format!(
                        "image is {}, sequence frames are {}",
                        frame.dimensions(),
                        expected
                    ),
                ));
            }
            Some(_) => {}
        }
        Ok(Some(frame))
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, MediaError> {
        if self.exhausted {
            return Ok(None);
        }
        let result = self.read_next();
        if !matches!(result, Ok(Some(_))) {
            self.exhausted = true;
        }
        result
    }

    fn frame_rate(&self) -> Option<f64> {
        Some(self.fps)
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.total)
    }
}
