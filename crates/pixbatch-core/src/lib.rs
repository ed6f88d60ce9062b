//! pixbatch core - in-place batch transforms over directories of images.
//!
//! A batch discovers the supported images in a flat directory, renders each
//! one (or each group, for channel merges) through a transform and replaces
//! the originals with the results. Outputs are staged in temp files and only
//! renamed into place once fully encoded, so a failed file is never left
//! half-written and its original is kept.
//!
//! ```text
//! Discover → Plan work items → Decode → Render → Stage → Rename → Remove inputs
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use pixbatch_core::{BatchTransformer, Config, PerFile, ResizeIfLarger, TracingObserver};
//!
//! fn main() -> pixbatch_core::Result<()> {
//!     let config = Config::load()?;
//!     let transformer = BatchTransformer::new(&config);
//!
//!     let result = transformer.run(
//!         "./photos".as_ref(),
//!         &PerFile(ResizeIfLarger::new(1000, 1000)),
//!         &mut TracingObserver,
//!     )?;
//!     println!("{} of {} files processed", result.succeeded, result.attempted);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod batch;
pub mod compose;
pub mod config;
pub mod error;
pub mod label;
pub mod pipeline;
pub mod raster;
pub mod transform;
pub mod workdir;

// Re-exports for convenient access
pub use batch::{
    BatchObserver, BatchOptions, BatchResult, BatchTransform, BatchTransformer, FileFailure,
    PerFile, SilentObserver, TracingObserver, WorkItem,
};
pub use compose::{compare_folders, concat, contact_sheet, ConcatOptions};
pub use config::Config;
pub use error::{ConfigError, ErrorKind, PipelineError, PipelineResult, PixbatchError, Result};
pub use label::{LabelColor, Labeler};
pub use pipeline::{ImageDecoder, ImageRef, RasterWriter};
pub use raster::{ColorSpace, Raster};
pub use transform::{
    AddNoise, Chain, GaussianBlur, MeanBlur, MedianBlur, MergeChannels, Normalize, Quarter,
    ResizeIfLarger, Rotate, SplitChannels, Transform,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
