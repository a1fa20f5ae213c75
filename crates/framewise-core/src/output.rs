//! Output directory and file naming.
//!
//! Every run writes into a fresh directory named after the operation, its
//! parameters and the local time, e.g. `Resize 0p5, 03_14_2024, 09_26_53`.
//! Files inside are named `<input stem><suffix>.<ext>`.

use std::fmt::Display;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::MediaError;

/// Format of the timestamp part of a directory name.
pub const TIMESTAMP_FORMAT: &str = "%m_%d_%Y, %H_%M_%S";

/// Encode a numeric parameter for use in a file name: `.` becomes `p`,
/// `-` becomes `n`.
pub fn encode_param(value: impl Display) -> String {
    value.to_string().replace('.', "p").replace('-', "n")
}

pub fn timestamp(now: NaiveDateTime) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// The directory a run writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescriptor {
    dir: PathBuf,
}

impl OutputDescriptor {
    /// Create `<root>/<label>, <timestamp>`.
    ///
    /// Fails with [`MediaError::OutputCollision`] if the directory exists;
    /// an existing directory is never reused.
    pub fn create(root: &Path, label: &str, now: NaiveDateTime) -> Result<Self, MediaError> {
        let dir = root.join(format!("{label}, {}", timestamp(now)));
        match fs::create_dir(&dir) {
            Ok(()) => Ok(Self { dir }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(MediaError::OutputCollision(dir)),
            Err(e) => Err(MediaError::io(dir, e)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of an output file.
    pub fn file_path(&self, stem: &str, suffix: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{stem}{suffix}.{extension}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_encode_param() {
        assert_eq!(encode_param(0.5), "0p5");
        assert_eq!(encode_param(-10), "n10");
        assert_eq!(encode_param(-2.25f32), "n2p25");
        assert_eq!(encode_param(45), "45");
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(timestamp(at(9, 26, 53)), "03_14_2024, 09_26_53");
    }

    #[test]
    fn test_create_and_name_files() {
        let root = TempDir::new().unwrap();
        let output = OutputDescriptor::create(root.path(), "Resize 0p5", at(9, 26, 53)).unwrap();

        assert!(output.dir().is_dir());
        assert!(output.dir().ends_with("Resize 0p5, 03_14_2024, 09_26_53"));
        assert_eq!(
            output.file_path("cells", "_rs_0p5", "png"),
            output.dir().join("cells_rs_0p5.png")
        );
    }

    #[test]
    fn test_existing_directory_is_a_collision() {
        let root = TempDir::new().unwrap();
        OutputDescriptor::create(root.path(), "ROI", at(1, 2, 3)).unwrap();

        let err = OutputDescriptor::create(root.path(), "ROI", at(1, 2, 3)).unwrap_err();
        assert!(matches!(err, MediaError::OutputCollision(_)));
        assert!(!err.is_recoverable());

        // A different second is a different directory
        assert!(OutputDescriptor::create(root.path(), "ROI", at(1, 2, 4)).is_ok());
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let root = TempDir::new().unwrap();
        let err =
            OutputDescriptor::create(&root.path().join("missing"), "ROI", at(1, 2, 3)).unwrap_err();
        assert!(matches!(err, MediaError::Io { .. }));
    }
}
