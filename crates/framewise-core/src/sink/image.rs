//! Still-image output.
//!
//! Images are always written as PNG so repeated passes over the same data
//! never accumulate compression loss.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::FrameSink;
use crate::error::{ensure_dimensions, MediaError};
use crate::frame::{Dimensions, Frame, CHANNELS};

/// Encode RGB pixel data to PNG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, MediaError> {
    if width == 0 || height == 0 {
        return Err(MediaError::Encode(format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }

    let expected_len = width as usize * height as usize * CHANNELS;
    if pixels.len() != expected_len {
        return Err(MediaError::Encode(format!(
            "expected {expected_len} bytes of pixel data, got {}",
            pixels.len()
        )));
    }

    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| MediaError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Write one PNG file. An existing file is never overwritten.
pub(crate) fn write_png(path: &Path, frame: &Frame) -> Result<(), MediaError> {
    let bytes = encode_png(&frame.pixels, frame.width, frame.height)?;
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(MediaError::OutputCollision(path.to_path_buf()))
        }
        Err(e) => return Err(MediaError::io(path, e)),
    };
    file.write_all(&bytes).map_err(|e| {
        let _ = fs::remove_file(path);
        MediaError::io(path, e)
    })
}

/// Writes exactly one frame to one file.
#[derive(Debug)]
pub struct ImageSink {
    path: PathBuf,
    dimensions: Dimensions,
    written: bool,
}

impl ImageSink {
    pub fn new(path: impl Into<PathBuf>, dimensions: Dimensions) -> Self {
        Self {
            path: path.into(),
            dimensions,
            written: false,
        }
    }
}

impl FrameSink for ImageSink {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn write(&mut self, frame: &Frame) -> Result<(), MediaError> {
        if self.written {
            return Err(MediaError::Encode(format!(
                "{} already holds a frame",
                self.path.display()
            )));
        }
        ensure_dimensions(self.dimensions, frame.dimensions())?;
        write_png(&self.path, frame)?;
        self.written = true;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        u64::from(self.written)
    }

    fn finish(&mut self) -> Result<PathBuf, MediaError> {
        if !self.written {
            return Err(MediaError::Encode(format!(
                "no frame was written to {}",
                self.path.display()
            )));
        }
        Ok(self.path.clone())
    }

    fn discard(&mut self) {
        if self.written {
            let _ = fs::remove_file(&self.path);
            self.written = false;
        }
    }
}
