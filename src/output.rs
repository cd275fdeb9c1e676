// src/output.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Image format written by `Figure::save`. SVG is the vector option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(format!("unsupported output format '{other}' (expected png or svg)")),
        }
    }
}

/// Creates `path` and any missing parents. Calling it on an existing directory is a no-op.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        log::debug!("Creating output directory '{}'", path.display());
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Local wall-clock timestamp with microsecond resolution, safe to embed in file names.
pub fn current_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S%6f").to_string()
}

/// Where a figure is written: folder, file stem and format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub folder: PathBuf,
    pub file_stem: String,
    pub format: OutputFormat,
}

impl OutputTarget {
    pub fn new(folder: impl Into<PathBuf>, file_stem: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            folder: folder.into(),
            file_stem: file_stem.into(),
            format,
        }
    }

    /// Target named `<prefix>-<timestamp>` so repeated runs never overwrite each other.
    pub fn timestamped(folder: impl Into<PathBuf>, prefix: &str, format: OutputFormat) -> Self {
        Self::new(folder, format!("{prefix}-{}", current_timestamp()), format)
    }

    pub fn path(&self) -> PathBuf {
        self.folder
            .join(format!("{}.{}", self.file_stem, self.format.extension()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("plots").join("paper");
        ensure_directory(&nested).unwrap();
        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_ensure_directory_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, b"x").unwrap();
        assert!(ensure_directory(&file).is_err());
    }

    #[test]
    fn test_target_path_uses_format_extension() {
        let target = OutputTarget::new("plots", "subject-01", OutputFormat::Svg);
        assert_eq!(target.path(), PathBuf::from("plots").join("subject-01.svg"));
    }

    #[test]
    fn test_timestamps_are_distinct() {
        let first = current_timestamp();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = current_timestamp();
        assert_ne!(first, second);
        assert_eq!(first.len(), 20);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("PNG".parse::<OutputFormat>(), Ok(OutputFormat::Png));
        assert_eq!("svg".parse::<OutputFormat>(), Ok(OutputFormat::Svg));
        assert!("pdf".parse::<OutputFormat>().is_err());
    }
}
