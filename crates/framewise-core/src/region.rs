//! Region-of-interest selection.
//!
//! A selector is asked once per item, with the item's first frame, for the
//! rectangle to crop. The chosen region is then applied unchanged to every
//! frame of that item. Interactive pickers live outside this crate and plug
//! in through [`RegionSelector`].

use crate::error::MediaError;
use crate::frame::Frame;
use crate::media::MediaItem;
use crate::transform::Region;

/// Chooses the crop rectangle for one media item.
pub trait RegionSelector: Send + Sync {
    fn select(&self, item: &MediaItem, first_frame: &Frame) -> Result<Region, MediaError>;
}

/// The same rectangle for every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRegion(pub Region);

impl RegionSelector for FixedRegion {
    fn select(&self, _item: &MediaItem, first_frame: &Frame) -> Result<Region, MediaError> {
        self.0.validate(first_frame.dimensions())?;
        Ok(self.0)
    }
}

impl<F> RegionSelector for F
where
    F: Fn(&MediaItem, &Frame) -> Result<Region, MediaError> + Send + Sync,
{
    fn select(&self, item: &MediaItem, first_frame: &Frame) -> Result<Region, MediaError> {
        self(item, first_frame)
    }
}
