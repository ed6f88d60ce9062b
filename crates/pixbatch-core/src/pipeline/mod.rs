//! File-level pipeline stages.
//!
//! - **discovery**: Find image files in a batch directory
//! - **decode**: Load and decode images with size limits
//! - **encode**: Stage outputs in temp files and rename them into place

pub mod decode;
pub mod discovery;
pub mod encode;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{FileDiscovery, ImageRef};
pub use encode::{RasterWriter, StagedFile};
