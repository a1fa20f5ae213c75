//! Run configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MediaError;
use crate::frame::FilterType;
use crate::media::VideoContainer;
use crate::operation::Operation;

/// Everything one run needs, fixed before the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// A media file, or a directory whose media are processed as a batch.
    pub input: PathBuf,
    /// Where the output directory is created. Defaults to the input
    /// directory, or the directory containing the input file.
    #[serde(default)]
    pub output_root: Option<PathBuf>,
    pub operation: Operation,
    /// Container for video input discovery and video output.
    #[serde(default)]
    pub container: VideoContainer,
    /// Resampling filter for resize and rotation.
    #[serde(default)]
    pub filter: FilterType,
    /// Items processed concurrently.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_jobs() -> usize {
    1
}

impl RunConfig {
    pub fn new(input: impl Into<PathBuf>, operation: Operation) -> Self {
        Self {
            input: input.into(),
            output_root: None,
            operation,
            container: VideoContainer::default(),
            filter: FilterType::default(),
            jobs: default_jobs(),
        }
    }

    pub fn validate(&self) -> Result<(), MediaError> {
        self.operation.validate()?;
        if self.jobs == 0 {
            return Err(MediaError::InvalidParameter(
                "jobs must be at least 1".into(),
            ));
        }
        if matches!(self.operation, Operation::Assemble { .. }) && !self.input.is_dir() {
            return Err(MediaError::InvalidParameter(format!(
                "assemble needs a directory of images, got {}",
                self.input.display()
            )));
        }
        Ok(())
    }

    /// Directory the run's output directory is created in.
    pub fn resolved_output_root(&self) -> PathBuf {
        if let Some(root) = &self.output_root {
            return root.clone();
        }
        if self.input.is_dir() {
            return self.input.clone();
        }
        self.input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{NormalizeScope, Region};
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RunConfig::new("/data/in", Operation::Resize { factor: 0.5 });
        assert_eq!(config.jobs, 1);
        assert_eq!(config.container, VideoContainer::Avi);
        assert_eq!(config.filter, FilterType::Cubic);
        assert!(config.output_root.is_none());
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let mut config = RunConfig::new("/data/in", Operation::Normalize {
            scope: NormalizeScope::Global,
        });
        config.jobs = 0;
        assert!(matches!(
            config.validate(),
            Err(MediaError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_operation_errors_surface() {
        let config = RunConfig::new("/data/in", Operation::Rotate { angle: 720.0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_assemble_needs_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.png");
        std::fs::write(&file, b"").unwrap();

        assert!(RunConfig::new(dir.path(), Operation::Assemble { fps: 2.0 })
            .validate()
            .is_ok());
        assert!(RunConfig::new(&file, Operation::Assemble { fps: 2.0 })
            .validate()
            .is_err());
    }

    #[test]
    fn test_output_root_resolution() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("clip.avi");
        std::fs::write(&file, b"").unwrap();

        let op = Operation::ExtractFrames;
        assert_eq!(
            RunConfig::new(dir.path(), op.clone()).resolved_output_root(),
            dir.path()
        );
        assert_eq!(
            RunConfig::new(&file, op.clone()).resolved_output_root(),
            dir.path()
        );

        let mut config = RunConfig::new(&file, op);
        config.output_root = Some(PathBuf::from("/elsewhere"));
        assert_eq!(config.resolved_output_root(), PathBuf::from("/elsewhere"));
        assert_eq!(
            RunConfig::new("clip.avi", Operation::ExtractFrames).resolved_output_root(),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_crop_with_region_is_valid() {
        let config = RunConfig::new(
            "/data/in",
            Operation::Crop {
                region: Some(Region::new(1, 2, 3, 4)),
            },
        );
        assert!(config.validate().is_ok());
    }
}
