//! Frame sources: where frames come from.
//!
//! A source is single-pass. It yields frames strictly in order until it
//! returns `Ok(None)`; after that, or after any error, it is exhausted and
//! keeps returning `Ok(None)`. Processing an item twice means opening it
//! twice.

mod image;
mod sequence;
#[cfg(feature = "video")]
mod video;

pub use self::image::SingleImageSource;
pub use self::sequence::ImageSequenceSource;
#[cfg(feature = "video")]
pub(crate) use self::video::init_ffmpeg;
#[cfg(feature = "video")]
pub use self::video::VideoStreamSource;

use std::path::Path;

use crate::error::MediaError;
use crate::frame::Frame;
use crate::media::{MediaItem, VideoFile};

/// A sequential, read-once stream of frames.
pub trait FrameSource {
    /// Read the next frame; `Ok(None)` signals end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, MediaError>;

    /// Frames per second, when the source has a rate.
    fn frame_rate(&self) -> Option<f64>;

    /// Declared number of frames, when known.
    fn frame_count(&self) -> Option<u64>;
}

/// Open the source matching a media item.
pub fn open_source(item: &MediaItem) -> Result<Box<dyn FrameSource>, MediaError> {
    match item {
        MediaItem::Image(image) => Ok(Box::new(SingleImageSource::open(image)?)),
        MediaItem::Sequence(seq) => Ok(Box::new(ImageSequenceSource::open(seq)?)),
        MediaItem::Video(video) => open_video(video),
    }
}

#[cfg(feature = "video")]
fn open_video(video: &VideoFile) -> Result<Box<dyn FrameSource>, MediaError> {
    Ok(Box::new(VideoStreamSource::open(video)?))
}

#[cfg(not(feature = "video"))]
fn open_video(video: &VideoFile) -> Result<Box<dyn FrameSource>, MediaError> {
    Err(MediaError::unreadable(
        &video.path,
        "video support not compiled in",
    ))
}

#[cfg(feature = "video")]
pub(crate) fn probe_video(path: &Path) -> Result<VideoFile, MediaError> {
    video::probe(path)
}

#[cfg(not(feature = "video"))]
pub(crate) fn probe_video(path: &Path) -> Result<VideoFile, MediaError> {
    Err(MediaError::unreadable(path, "video support not compiled in"))
}

/// Frames held in memory, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: std::collections::VecDeque<Frame>,
    fps: Option<f64>,
    declared: u64,
    read: u64,
}

impl MemorySource {
    pub fn new(frames: Vec<Frame>, fps: Option<f64>) -> Self {
        let declared = frames.len() as u64;
        Self::with_declared_count(frames, fps, declared)
    }

    /// Source that claims `declared` frames; reads stop there even when
    /// more frames are queued.
    pub fn with_declared_count(frames: Vec<Frame>, fps: Option<f64>, declared: u64) -> Self {
        Self {
            frames: frames.into(),
            fps,
            declared,
            read: 0,
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<Frame>, MediaError> {
        if self.read >= self.declared {
            return Ok(None);
        }
        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.read += 1;
        }
        Ok(frame)
    }

    fn frame_rate(&self) -> Option<f64> {
        self.fps
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.declared)
    }
}
