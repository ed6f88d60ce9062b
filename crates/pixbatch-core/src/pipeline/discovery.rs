//! File discovery for finding images in a batch directory.

use image::ImageFormat;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

/// Prefix of in-flight temp files written by [`RasterWriter`](super::RasterWriter).
pub const TEMP_PREFIX: &str = ".pixbatch-";

/// Discovers image files in a flat directory.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// A discovered raster file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    /// Full path to the file
    pub path: PathBuf,
    /// Format inferred from the extension, if `image` knows it
    pub format: Option<ImageFormat>,
    /// File size in bytes
    pub size: u64,
}

impl ImageRef {
    /// Describe a path without touching the filesystem.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = ImageFormat::from_path(&path).ok();
        Self {
            path,
            format,
            size: 0,
        }
    }

    /// File name as a string, lossy.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// List supported image files directly inside `dir`.
    ///
    /// Subdirectories, hidden files and in-flight temp files are skipped.
    /// Results are sorted by path so batches run in a stable order.
    pub fn discover(&self, dir: &Path) -> Vec<ImageRef> {
        let mut files: Vec<ImageRef> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| !is_hidden(entry.path()))
            .filter(|entry| self.is_supported(entry.path()))
            .filter_map(|entry| {
                let size = entry.metadata().ok()?.len();
                let path = entry.into_path();
                Some(ImageRef {
                    format: ImageFormat::from_path(&path).ok(),
                    path,
                    size,
                })
            })
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Check if a file has a supported extension.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[ImageRef]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.') || n.starts_with(TEMP_PREFIX))
        .unwrap_or(false)
}
