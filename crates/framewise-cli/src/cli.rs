//! Command-line arguments and their translation into a [`RunConfig`].

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use framewise_core::{FilterType, NormalizeScope, Operation, Region, RunConfig, VideoContainer};

#[derive(Parser, Debug)]
#[command(name = "framewise")]
#[command(about = "Apply one transform to every image and video frame in a folder")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rotate counter-clockwise by an angle in degrees, keeping frame size
    Rotate {
        #[arg(allow_negative_numbers = true)]
        angle: f64,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Scale width and height by a factor
    Resize {
        factor: f64,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Crop to a region of interest
    Crop {
        /// Region as x,y,width,height
        #[arg(long)]
        roi: Region,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Linear contrast: out = alpha * in + beta
    Contrast {
        #[arg(long, allow_negative_numbers = true)]
        alpha: f32,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        beta: f32,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Stretch intensities to the full 0-255 range
    Normalize {
        /// One range over all channels instead of one per channel
        #[arg(long)]
        global: bool,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Keep video frames start..=end (zero-based)
    Trim {
        #[arg(long)]
        start: u64,
        #[arg(long)]
        end: u64,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Write every video frame as a PNG
    Extract {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Join a folder of images into one video
    Assemble {
        #[arg(long)]
        fps: f64,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Run from a TOML configuration file
    Run {
        #[arg(long)]
        config: PathBuf,
    },
}

/// Arguments shared by every operation.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Media file or folder to process
    pub input: PathBuf,

    /// Folder to create the output folder in [default: next to the input]
    #[arg(short, long)]
    pub output_root: Option<PathBuf>,

    /// Video container for input and output
    #[arg(long, value_enum, default_value_t = ContainerArg::Avi)]
    pub container: ContainerArg,

    /// Resampling filter for resize and rotate
    #[arg(long, value_enum, default_value_t = FilterArg::Cubic)]
    pub filter: FilterArg,

    /// Items to process in parallel
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerArg {
    Avi,
    Mp4,
}

impl From<ContainerArg> for VideoContainer {
    fn from(arg: ContainerArg) -> Self {
        match arg {
            ContainerArg::Avi => VideoContainer::Avi,
            ContainerArg::Mp4 => VideoContainer::Mp4,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterArg {
    Nearest,
    Bilinear,
    Cubic,
    Lanczos3,
}

impl From<FilterArg> for FilterType {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Nearest => FilterType::Nearest,
            FilterArg::Bilinear => FilterType::Bilinear,
            FilterArg::Cubic => FilterType::Cubic,
            FilterArg::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl CommonArgs {
    fn into_config(self, operation: Operation) -> RunConfig {
        RunConfig {
            input: self.input,
            output_root: self.output_root,
            operation,
            container: self.container.into(),
            filter: self.filter.into(),
            jobs: self.jobs,
        }
    }
}

impl Command {
    /// Build the run configuration, reading the config file for `run`.
    pub fn into_config(self) -> Result<RunConfig> {
        let (common, operation) = match self {
            Command::Run { config } => return load_config(&config),
            Command::Rotate { angle, common } => (common, Operation::Rotate { angle }),
            Command::Resize { factor, common } => (common, Operation::Resize { factor }),
            Command::Crop { roi, common } => (common, Operation::Crop { region: Some(roi) }),
            Command::Contrast {
                alpha,
                beta,
                common,
            } => (common, Operation::Contrast { alpha, beta }),
            Command::Normalize { global, common } => {
                let scope = if global {
                    NormalizeScope::Global
                } else {
                    NormalizeScope::PerChannel
                };
                (common, Operation::Normalize { scope })
            }
            Command::Trim { start, end, common } => (common, Operation::Trim { start, end }),
            Command::Extract { common } => (common, Operation::ExtractFrames),
            Command::Assemble { fps, common } => (common, Operation::Assemble { fps }),
        };
        Ok(common.into_config(operation))
    }
}

pub fn load_config(path: &std::path::Path) -> Result<RunConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}
