//! Media items and discovery.
//!
//! Discovery only classifies paths. Video metadata (rate, size, frame count)
//! is probed when the item is resolved, so one unreadable video fails on its
//! own instead of failing the listing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MediaError;
use crate::frame::Dimensions;

/// Recognized still-image extensions (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff"];

/// Video container used for input discovery and for output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoContainer {
    /// AVI with an XVID-tagged MPEG-4 stream.
    #[default]
    Avi,
    /// MP4 with an mp4v-tagged MPEG-4 stream, for players that lack AVI support.
    Mp4,
}

impl VideoContainer {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            VideoContainer::Avi => "avi",
            VideoContainer::Mp4 => "mp4",
        }
    }

    /// FourCC written into the output stream.
    pub fn fourcc(self) -> [u8; 4] {
        match self {
            VideoContainer::Avi => *b"XVID",
            VideoContainer::Mp4 => *b"mp4v",
        }
    }
}

/// Kind of a discovered path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A discovered, not yet opened, media path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub path: PathBuf,
    pub kind: MediaKind,
}

/// A still image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub format: image::ImageFormat,
}

impl ImageFile {
    /// Identify the image format from the file extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, MediaError> {
        let path = path.into();
        let format = image::ImageFormat::from_path(&path)
            .map_err(|e| MediaError::unreadable(&path, e))?;
        Ok(Self { path, format })
    }
}

/// A video with its declared stream properties.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFile {
    pub path: PathBuf,
    /// Average frame rate reported by the container.
    pub fps: f64,
    /// Declared frame size.
    pub dimensions: Dimensions,
    /// Declared number of frames, when the container reports one.
    pub frame_count: Option<u64>,
}

impl VideoFile {
    /// Open the container and read its stream properties.
    pub fn probe(path: impl Into<PathBuf>) -> Result<Self, MediaError> {
        crate::source::probe_video(&path.into())
    }
}

/// An ordered directory of equally sized images played as one video.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSequence {
    /// Name of the sequence, used for the output file.
    pub name: String,
    /// Frames in playback order.
    pub frames: Vec<PathBuf>,
    /// Playback rate for the assembled video.
    pub fps: f64,
}

impl ImageSequence {
    /// Collect the images of `dir`, sorted by file name.
    pub fn from_dir(dir: &Path, fps: f64) -> Result<Self, MediaError> {
        let frames: Vec<PathBuf> = discover(dir, VideoContainer::default())?
            .into_iter()
            .filter(|entry| entry.kind == MediaKind::Image)
            .map(|entry| entry.path)
            .collect();

        if frames.is_empty() {
            return Err(MediaError::InvalidParameter(format!(
                "no images found in {}",
                dir.display()
            )));
        }

        Ok(Self {
            name: file_stem(dir),
            frames,
            fps,
        })
    }
}

/// One unit of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaItem {
    Image(ImageFile),
    Video(VideoFile),
    Sequence(ImageSequence),
}

impl MediaItem {
    /// Resolve a discovered entry, probing videos.
    pub fn resolve(entry: &MediaEntry) -> Result<Self, MediaError> {
        match entry.kind {
            MediaKind::Image => Ok(MediaItem::Image(ImageFile::from_path(&entry.path)?)),
            MediaKind::Video => Ok(MediaItem::Video(VideoFile::probe(&entry.path)?)),
        }
    }

    /// Path identifying this item in reports.
    pub fn path(&self) -> &Path {
        match self {
            MediaItem::Image(image) => &image.path,
            MediaItem::Video(video) => &video.path,
            MediaItem::Sequence(seq) => seq
                .frames
                .first()
                .and_then(|p| p.parent())
                .unwrap_or_else(|| Path::new(&seq.name)),
        }
    }

    /// Base name for output files.
    pub fn stem(&self) -> String {
        match self {
            MediaItem::Sequence(seq) => seq.name.clone(),
            other => file_stem(other.path()),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaItem::Image(_) => MediaKind::Image,
            MediaItem::Video(_) | MediaItem::Sequence(_) => MediaKind::Video,
        }
    }
}

/// File name up to the first dot.
pub(crate) fn file_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name,
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

/// Classify a single path by extension.
pub fn classify(path: &Path, container: VideoContainer) -> Option<MediaKind> {
    let ext = extension_of(path)?;
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if ext == container.extension() {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// List the media to process.
///
/// A file yields itself; a directory yields its images sorted by name
/// followed by its videos of `container` sorted by name. Subdirectories
/// are not searched.
pub fn discover(input: &Path, container: VideoContainer) -> Result<Vec<MediaEntry>, MediaError> {
    if input.is_file() {
        let kind = classify(input, container).ok_or_else(|| {
            MediaError::InvalidParameter(format!(
                "{} is not a supported image or .{} video",
                input.display(),
                container.extension()
            ))
        })?;
        return Ok(vec![MediaEntry {
            path: input.to_path_buf(),
            kind,
        }]);
    }

    let mut images = Vec::new();
    let mut videos = Vec::new();

    let entries = fs::read_dir(input).map_err(|e| MediaError::io(input, e))?;
    for entry in entries {
        let path = entry.map_err(|e| MediaError::io(input, e))?.path();
        if !path.is_file() {
            continue;
        }
        match classify(&path, container) {
            Some(MediaKind::Image) => images.push(path),
            Some(MediaKind::Video) => videos.push(path),
            None => {}
        }
    }

    images.sort();
    videos.sort();

    let found: Vec<MediaEntry> = images
        .into_iter()
        .map(|path| MediaEntry {
            path,
            kind: MediaKind::Image,
        })
        .chain(videos.into_iter().map(|path| MediaEntry {
            path,
            kind: MediaKind::Video,
        }))
        .collect();

    if found.is_empty() {
        return Err(MediaError::InvalidParameter(format!(
            "no media found in {}",
            input.display()
        )));
    }

    Ok(found)
}
