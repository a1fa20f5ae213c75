//! Numbered PNG files, one per frame.

use std::fs;
use std::path::PathBuf;

use super::image::write_png;
use super::FrameSink;
use crate::error::{ensure_dimensions, MediaError};
use crate::frame::{Dimensions, Frame};

/// Largest frame count a five-digit ordinal can name.
pub const MAX_SEQUENCE_FRAMES: u64 = 100_000;

/// Writes `<stem>_frame_<NNNNN>.png` into a directory, ordinals from zero.
#[derive(Debug)]
pub struct ImageSequenceSink {
    dir: PathBuf,
    stem: String,
    dimensions: Dimensions,
    written: Vec<PathBuf>,
}

impl ImageSequenceSink {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>, dimensions: Dimensions) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            dimensions,
            written: Vec::new(),
        }
    }

    /// Path of the frame with the given ordinal.
    pub fn frame_path(&self, ordinal: u64) -> PathBuf {
        self.dir
            .join(format!("{}_frame_{:05}.png", self.stem, ordinal))
    }
}

impl FrameSink for ImageSequenceSink {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn write(&mut self, frame: &Frame) -> Result<(), MediaError> {
        let ordinal = self.written.len() as u64;
        if ordinal >= MAX_SEQUENCE_FRAMES {
            return Err(MediaError::InvalidParameter(format!(
                "{} has more than {MAX_SEQUENCE_FRAMES} frames",
                self.stem
            )));
        }
        ensure_dimensions(self.dimensions, frame.dimensions())?;

        let path = self.frame_path(ordinal);
        write_png(&path, frame)?;
        self.written.push(path);
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.written.len() as u64
    }

    fn finish(&mut self) -> Result<PathBuf, MediaError> {
        Ok(self.dir.clone())
    }

    fn discard(&mut self) {
        for path in self.written.drain(..) {
            let _ = fs::remove_file(path);
        }
    }
}
