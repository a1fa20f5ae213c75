//! Frame sinks: where frames go.
//!
//! Every sink is bound to one frame size when it is opened and rejects
//! frames of any other size before they reach an encoder. A sink is either
//! finished, which flushes and closes its output, or discarded, which removes
//! whatever it has written so far.

mod image;
mod sequence;
#[cfg(feature = "video")]
mod video;

pub use self::image::{encode_png, ImageSink};
pub use self::sequence::{ImageSequenceSink, MAX_SEQUENCE_FRAMES};
#[cfg(feature = "video")]
pub use self::video::VideoSink;

use std::path::{Path, PathBuf};

use crate::error::{ensure_dimensions, MediaError};
use crate::frame::{Dimensions, Frame};
use crate::media::VideoContainer;

/// Consumer of a sequential stream of equally sized frames.
pub trait FrameSink {
    /// Frame size every written frame must have.
    fn dimensions(&self) -> Dimensions;

    /// Append one frame.
    fn write(&mut self, frame: &Frame) -> Result<(), MediaError>;

    /// Number of frames accepted so far.
    fn frames_written(&self) -> u64;

    /// Flush and close the output, returning where it was written.
    fn finish(&mut self) -> Result<PathBuf, MediaError>;

    /// Abandon the output and remove any partially written files.
    fn discard(&mut self);
}

/// Open a video encoder writing to `path`.
#[cfg(feature = "video")]
pub fn open_video_sink(
    path: &Path,
    dimensions: Dimensions,
    fps: f64,
    container: VideoContainer,
) -> Result<Box<dyn FrameSink>, MediaError> {
    Ok(Box::new(VideoSink::create(path, dimensions, fps, container)?))
}

#[cfg(not(feature = "video"))]
pub fn open_video_sink(
    path: &Path,
    _dimensions: Dimensions,
    _fps: f64,
    _container: VideoContainer,
) -> Result<Box<dyn FrameSink>, MediaError> {
    Err(MediaError::Encode(format!(
        "cannot write {}: video support not compiled in",
        path.display()
    )))
}

/// Collects frames in memory.
#[derive(Debug)]
pub struct MemorySink {
    dimensions: Dimensions,
    frames: Vec<Frame>,
    finished: bool,
    discarded: bool,
    finish_error: Option<String>,
}

impl MemorySink {
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            frames: Vec::new(),
            finished: false,
            discarded: false,
            finish_error: None,
        }
    }

    /// Sink whose `finish` fails with an encoder error.
    pub fn failing_on_finish(dimensions: Dimensions, reason: impl Into<String>) -> Self {
        Self {
            finish_error: Some(reason.into()),
            ..Self::new(dimensions)
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }
}

impl FrameSink for MemorySink {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn write(&mut self, frame: &Frame) -> Result<(), MediaError> {
        ensure_dimensions(self.dimensions, frame.dimensions())?;
        self.frames.push(frame.clone());
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames.len() as u64
    }

    fn finish(&mut self) -> Result<PathBuf, MediaError> {
        if let Some(reason) = &self.finish_error {
            return Err(MediaError::Encode(reason.clone()));
        }
        self.finished = true;
        Ok(PathBuf::new())
    }

    fn discard(&mut self) {
        self.frames.clear();
        self.discarded = true;
    }
}
