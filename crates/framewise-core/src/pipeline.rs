//! Batch orchestration: discovery, then source, transform and sink per item.
//!
//! Each item is processed as one strictly ordered stream. The transform is
//! resolved from the item's first frame and the sink is sized from the
//! transform's output dimensions before anything is written, so every
//! frame the sink sees has the same geometry.
//!
//! Items share nothing but the output directory, so with `jobs > 1` they
//! run concurrently on a rayon pool. Reports list items in input order
//! regardless of completion order.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::error::{ensure_dimensions, MediaError};
use crate::frame::{Dimensions, Frame};
use crate::media::{discover, ImageSequence, MediaEntry, MediaItem};
use crate::operation::Operation;
use crate::output::OutputDescriptor;
use crate::region::RegionSelector;
use crate::sink::{open_video_sink, FrameSink, ImageSequenceSink, ImageSink};
use crate::source::{open_source, FrameSource};
use crate::transform::Transform;

/// Shared flag that stops running streams between frames.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), MediaError> {
        if self.is_cancelled() {
            return Err(MediaError::Cancelled);
        }
        Ok(())
    }
}

/// What happened to one item of a batch.
#[derive(Debug)]
pub enum ItemOutcome {
    Written {
        input: PathBuf,
        output: PathBuf,
        frames: u64,
    },
    Skipped {
        input: PathBuf,
        error: MediaError,
    },
}

impl ItemOutcome {
    pub fn input(&self) -> &Path {
        match self {
            ItemOutcome::Written { input, .. } | ItemOutcome::Skipped { input, .. } => input,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, ItemOutcome::Written { .. })
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    /// One entry per item, in input order.
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.items.iter().filter(|i| i.is_written()).count()
    }

    pub fn skipped(&self) -> usize {
        self.items.len() - self.written()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped() == 0
    }
}

/// A stream whose first frame has been read and whose transform is fixed.
pub struct StreamStart {
    first: Frame,
    ordinal: u64,
    transform: Box<dyn Transform>,
    output_dimensions: Dimensions,
}

impl StreamStart {
    /// Size of every frame the stream will produce.
    pub fn output_dimensions(&self) -> Dimensions {
        self.output_dimensions
    }
}

/// One unit of work: a discovered path still to be probed, or a ready item.
#[derive(Debug)]
enum Job {
    Discovered(MediaEntry),
    Ready(MediaItem),
}

impl Job {
    fn path(&self) -> &Path {
        match self {
            Job::Discovered(entry) => &entry.path,
            Job::Ready(item) => item.path(),
        }
    }
}

pub struct Pipeline {
    config: RunConfig,
    selector: Option<Box<dyn RegionSelector>>,
    cancel: CancelFlag,
}

impl Pipeline {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            selector: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Choose crop regions per item instead of using the configured one.
    pub fn with_selector(mut self, selector: impl RegionSelector + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Process every item of the configured input.
    ///
    /// Recoverable item failures are recorded in the report and the batch
    /// continues. Any other failure ends the run with that error.
    pub fn run(&self) -> Result<BatchReport, MediaError> {
        self.config.validate()?;
        let needs_selector = matches!(self.config.operation, Operation::Crop { region: None });
        if needs_selector && self.selector.is_none() {
            return Err(MediaError::InvalidParameter(
                "crop needs a region or a region selector".into(),
            ));
        }

        let jobs = self.plan()?;
        let operation = &self.config.operation;
        let output = OutputDescriptor::create(
            &self.config.resolved_output_root(),
            &operation.dir_label(),
            Local::now().naive_local(),
        )?;

        info!(
            operation = operation.name(),
            items = jobs.len(),
            workers = self.config.jobs,
            output = %output.dir().display(),
            "starting batch"
        );

        let items = if self.config.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.jobs)
                .build()
                .map_err(|e| MediaError::InvalidParameter(format!("cannot start workers: {e}")))?;
            let results: Vec<Result<ItemOutcome, MediaError>> = pool.install(|| {
                jobs.par_iter()
                    .map(|job| self.run_job(job, &output))
                    .collect()
            });
            results.into_iter().collect::<Result<Vec<_>, _>>()?
        } else {
            let mut items = Vec::with_capacity(jobs.len());
            for job in &jobs {
                items.push(self.run_job(job, &output)?);
            }
            items
        };

        let report = BatchReport {
            output_dir: output.dir().to_path_buf(),
            items,
        };
        info!(
            written = report.written(),
            skipped = report.skipped(),
            "batch finished"
        );
        Ok(report)
    }

    fn plan(&self) -> Result<Vec<Job>, MediaError> {
        let input = &self.config.input;
        let operation = &self.config.operation;

        if let Operation::Assemble { fps } = *operation {
            let sequence = ImageSequence::from_dir(input, fps)?;
            return Ok(vec![Job::Ready(MediaItem::Sequence(sequence))]);
        }

        let jobs: Vec<Job> = discover(input, self.config.container)?
            .into_iter()
            .filter(|entry| operation.accepts(entry.kind))
            .map(Job::Discovered)
            .collect();

        if jobs.is_empty() {
            return Err(MediaError::InvalidParameter(format!(
                "nothing in {} that {} applies to",
                input.display(),
                operation.name()
            )));
        }
        Ok(jobs)
    }

    fn run_job(&self, job: &Job, output: &OutputDescriptor) -> Result<ItemOutcome, MediaError> {
        let input = job.path().to_path_buf();
        let result = match job {
            Job::Discovered(entry) => {
                MediaItem::resolve(entry).and_then(|item| self.process_item(&item, output))
            }
            Job::Ready(item) => self.process_item(item, output),
        };

        match result {
            Ok((written, frames)) => {
                info!(
                    input = %input.display(),
                    output = %written.display(),
                    frames,
                    "item written"
                );
                Ok(ItemOutcome::Written {
                    input,
                    output: written,
                    frames,
                })
            }
            Err(e) if e.is_recoverable() => {
                warn!(input = %input.display(), error = %e, "skipping item");
                Ok(ItemOutcome::Skipped { input, error: e })
            }
            Err(e) => {
                error!(input = %input.display(), error = %e, "aborting batch");
                Err(e)
            }
        }
    }

    /// Run one item into the output directory, returning the written path
    /// and frame count.
    pub fn process_item(
        &self,
        item: &MediaItem,
        output: &OutputDescriptor,
    ) -> Result<(PathBuf, u64), MediaError> {
        let mut source = open_source(item)?;
        let start = self.start_stream(item, source.as_mut())?;
        let mut sink = self.open_sink(
            item,
            output,
            start.output_dimensions(),
            source.frame_rate(),
        )?;
        let frames = self.drive_stream(start, source.as_mut(), sink.as_mut())?;
        let path = finish_or_discard(sink.as_mut())?;
        Ok((path, frames))
    }

    /// Read up to the first frame to keep and resolve the item's transform.
    pub fn start_stream(
        &self,
        item: &MediaItem,
        source: &mut dyn FrameSource,
    ) -> Result<StreamStart, MediaError> {
        let range = self.config.operation.frame_range();
        let mut ordinal = 0u64;

        let first = loop {
            self.cancel.check()?;
            if past_end(range.as_ref(), ordinal) {
                return Err(self.empty_range(item));
            }
            match source.next_frame()? {
                Some(frame) if in_range(range.as_ref(), ordinal) => break frame,
                Some(_) => ordinal += 1,
                None if range.is_some() => return Err(self.empty_range(item)),
                None => return Err(MediaError::unreadable(item.path(), "no frames")),
            }
        };

        let transform = self.config.operation.resolve_transform(
            item,
            &first,
            self.selector.as_deref(),
            self.config.filter,
        )?;
        let output_dimensions = transform.output_dimensions(first.dimensions())?;

        debug!(
            item = %item.path().display(),
            input = %first.dimensions(),
            output = %output_dimensions,
            first_ordinal = ordinal,
            "stream started"
        );

        Ok(StreamStart {
            first,
            ordinal,
            transform,
            output_dimensions,
        })
    }

    /// Transform and write frames until the source ends or the frame range
    /// is passed. On any error the sink is discarded.
    pub fn drive_stream(
        &self,
        start: StreamStart,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> Result<u64, MediaError> {
        let result = self.pump(start, source, sink);
        if result.is_err() {
            sink.discard();
        }
        result
    }

    fn pump(
        &self,
        start: StreamStart,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> Result<u64, MediaError> {
        let range = self.config.operation.frame_range();
        let StreamStart {
            first,
            mut ordinal,
            transform,
            ..
        } = start;

        let mut next = Some(first);
        while let Some(frame) = next {
            let out = transform.apply(&frame)?;
            ensure_dimensions(sink.dimensions(), out.dimensions())?;
            sink.write(&out)?;

            ordinal += 1;
            if past_end(range.as_ref(), ordinal) {
                break;
            }
            self.cancel.check()?;
            next = source.next_frame()?;
        }
        Ok(sink.frames_written())
    }

    fn open_sink(
        &self,
        item: &MediaItem,
        output: &OutputDescriptor,
        dimensions: Dimensions,
        fps: Option<f64>,
    ) -> Result<Box<dyn FrameSink>, MediaError> {
        let operation = &self.config.operation;
        let stem = item.stem();

        if operation.writes_frames() {
            return Ok(Box::new(ImageSequenceSink::new(
                output.dir(),
                stem,
                dimensions,
            )));
        }

        let suffix = operation.file_suffix();
        match item {
            MediaItem::Image(_) => Ok(Box::new(ImageSink::new(
                output.file_path(&stem, &suffix, "png"),
                dimensions,
            ))),
            MediaItem::Video(_) | MediaItem::Sequence(_) => {
                let fps =
                    fps.ok_or_else(|| MediaError::unreadable(item.path(), "no frame rate"))?;
                let container = self.config.container;
                let path = output.file_path(&stem, &suffix, container.extension());
                if path.exists() {
                    return Err(MediaError::OutputCollision(path));
                }
                open_video_sink(&path, dimensions, fps, container)
            }
        }
    }

    fn empty_range(&self, item: &MediaItem) -> MediaError {
        MediaError::NotApplicable {
            path: item.path().to_path_buf(),
            operation: format!("{} (no frames in range)", self.config.operation.dir_label()),
        }
    }
}

/// Finalize the sink, removing its partial output if that fails.
fn finish_or_discard(sink: &mut dyn FrameSink) -> Result<PathBuf, MediaError> {
    match sink.finish() {
        Ok(path) => Ok(path),
        Err(e) => {
            sink.discard();
            Err(e)
        }
    }
}

fn in_range(range: Option<&RangeInclusive<u64>>, ordinal: u64) -> bool {
    range.map_or(true, |r| r.contains(&ordinal))
}

fn past_end(range: Option<&RangeInclusive<u64>>, ordinal: u64) -> bool {
    range.is_some_and(|r| ordinal > *r.end())
}
