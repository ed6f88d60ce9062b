//! Error types for pixbatch.
//!
//! Errors carry the context needed to act on them (file paths, transform
//! names, the offending parameter). Per-file errors are collected into a
//! [`BatchResult`](crate::batch::BatchResult) and only surface to the caller
//! in strict mode.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::raster::ColorSpace;

/// Top-level error type for pixbatch operations.
#[derive(Error, Debug)]
pub enum PixbatchError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while decoding, transforming or writing images.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// A transform parameter violates the transform's precondition
    #[error("Invalid parameter for {transform}: {message}")]
    InvalidParameter {
        transform: &'static str,
        message: String,
    },

    /// A transform was given a raster in a color space it does not accept
    #[error("{transform} does not accept {color_space} images")]
    UnsupportedColorSpace {
        transform: &'static str,
        color_space: ColorSpace,
    },

    /// Encoding or writing the output failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// A required sibling input (e.g. a channel file) is absent
    #[error("Missing component: {0}")]
    MissingComponent(PathBuf),

    /// Inputs that must share dimensions do not
    #[error(
        "Dimension mismatch: expected {}x{}, found {}x{}",
        expected.0, expected.1, found.0, found.1
    )]
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// An output path is also read or written for `other` in the same batch
    #[error("Output collision: {path} is shared with {other}")]
    OutputCollision { path: PathBuf, other: PathBuf },

    /// Batch target is missing or not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Filesystem operation failed
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse error classification used in batch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Decode,
    Transform,
    Encode,
    MissingComponent,
    DimensionMismatch,
    Io,
}

impl PipelineError {
    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. }
            | Self::FileNotFound(_)
            | Self::FileTooLarge { .. }
            | Self::ImageTooLarge { .. }
            | Self::UnsupportedFormat { .. } => ErrorKind::Decode,
            Self::InvalidParameter { .. } | Self::UnsupportedColorSpace { .. } => {
                ErrorKind::Transform
            }
            Self::Encode { .. } | Self::OutputCollision { .. } => ErrorKind::Encode,
            Self::MissingComponent(_) => ErrorKind::MissingComponent,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::NotADirectory(_) | Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(transform: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            transform,
            message: message.into(),
        }
    }
}

/// Convenience type alias for pixbatch results.
pub type Result<T> = std::result::Result<T, PixbatchError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
