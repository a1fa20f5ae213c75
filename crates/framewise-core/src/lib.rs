//! Framewise Core - frame transform pipeline
//!
//! This crate applies one geometric or photometric transform uniformly to
//! still images and to every frame of a video, writing the results to a
//! freshly named output directory.
//!
//! The building blocks are a [`FrameSource`] (where frames come from), a
//! [`Transform`] (a pure frame-to-frame function), and a [`FrameSink`]
//! (where frames go). [`Pipeline`] wires them together for each item of a
//! batch.

pub mod config;
pub mod error;
pub mod frame;
pub mod media;
pub mod operation;
pub mod output;
pub mod pipeline;
pub mod region;
pub mod sink;
pub mod source;
pub mod transform;

pub use config::RunConfig;
pub use error::MediaError;
pub use frame::{Dimensions, FilterType, Frame};
pub use media::{discover, ImageSequence, MediaEntry, MediaItem, MediaKind, VideoContainer};
pub use operation::Operation;
pub use output::OutputDescriptor;
pub use pipeline::{BatchReport, CancelFlag, ItemOutcome, Pipeline};
pub use region::{FixedRegion, RegionSelector};
pub use sink::FrameSink;
pub use source::FrameSource;
pub use transform::{NormalizeScope, Region, Transform};
