//! Single still-image source.

use std::path::Path;

use tracing::debug;

use super::FrameSource;
use crate::error::MediaError;
use crate::frame::Frame;
use crate::media::ImageFile;

/// Decode an image file into an RGB frame.
pub(crate) fn decode_image(path: &Path) -> Result<Frame, MediaError> {
    let decoded = image::open(path).map_err(|e| MediaError::unreadable(path, e))?;
    let frame = Frame::from_rgb_image(decoded.to_rgb8());
    if frame.is_empty() {
        return Err(MediaError::unreadable(path, "image has no pixels"));
    }
    Ok(frame)
}

/// Yields exactly one frame, then end of stream.
#[derive(Debug)]
pub struct SingleImageSource {
    frame: Option<Frame>,
}

impl SingleImageSource {
    /// Decode the image eagerly so open fails on unreadable files.
    pub fn open(image: &ImageFile) -> Result<Self, MediaError> {
        let frame = decode_image(&image.path)?;
        debug!(
            path = %image.path.display(),
            format = ?image.format,
            size = %frame.dimensions(),
            "decoded image"
        );
        Ok(Self { frame: Some(frame) })
    }

    pub fn from_frame(frame: Frame) -> Self {
        Self { frame: Some(frame) }
    }
}

impl FrameSource for SingleImageSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, MediaError> {
        Ok(self.frame.take())
    }

    fn frame_rate(&self) -> Option<f64> {
        None
    }

    fn frame_count(&self) -> Option<u64> {
        Some(1)
    }
}
