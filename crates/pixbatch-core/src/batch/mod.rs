//! In-place batch execution over a directory of images.
//!
//! A [`BatchTransform`] turns the discovered files into [`WorkItem`]s (its
//! naming policy) and renders each item's decoded inputs into output rasters.
//! [`BatchTransformer`] drives the items one by one, staging every output
//! before anything on disk is replaced.

mod observer;
mod result;
mod runner;

pub use observer::{BatchObserver, SilentObserver, TracingObserver};
pub use result::{BatchResult, FileFailure};
pub use runner::{BatchOptions, BatchTransformer};

use std::path::{Path, PathBuf};

use crate::error::PipelineResult;
use crate::pipeline::encode::normalized_path;
use crate::pipeline::ImageRef;
use crate::raster::Raster;
use crate::transform::Transform;

/// Inputs read and outputs written by one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
}

impl WorkItem {
    /// `input` rewritten to `dir/stem.png`.
    pub fn one_to_one(input: &Path) -> Self {
        Self {
            inputs: vec![input.to_path_buf()],
            outputs: vec![normalized_path(input)],
        }
    }

    /// Path the item is reported under (its first input).
    pub fn path(&self) -> &Path {
        self.inputs.first().map(PathBuf::as_path).unwrap_or(Path::new(""))
    }
}

/// A transform together with the policy naming its outputs.
pub trait BatchTransform: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Human-readable description including parameters.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Check parameters before any file is touched.
    fn validate(&self) -> PipelineResult<()> {
        Ok(())
    }

    /// Group the discovered files into work items.
    fn plan(&self, files: &[ImageRef]) -> Vec<WorkItem>;

    /// Turn one item's decoded inputs into its outputs, in order.
    fn render(&self, inputs: Vec<Raster>) -> PipelineResult<Vec<Raster>>;
}

/// Runs a one-to-one [`Transform`] on every file, writing `stem.png`.
#[derive(Debug, Clone)]
pub struct PerFile<T>(pub T);

impl<T: Transform> BatchTransform for PerFile<T> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn describe(&self) -> String {
        self.0.describe()
    }

    fn validate(&self) -> PipelineResult<()> {
        self.0.validate()
    }

    fn plan(&self, files: &[ImageRef]) -> Vec<WorkItem> {
        files.iter().map(|f| WorkItem::one_to_one(&f.path)).collect()
    }

    fn render(&self, inputs: Vec<Raster>) -> PipelineResult<Vec<Raster>> {
        inputs
            .iter()
            .map(|raster| self.0.transform(raster))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Quarter, Rotate};
    use image::GrayImage;

    #[test]
    fn test_one_to_one_normalizes_extension() {
        let item = WorkItem::one_to_one(Path::new("/d/photo.JPG"));
        assert_eq!(item.path(), Path::new("/d/photo.JPG"));
        assert_eq!(item.outputs, vec![PathBuf::from("/d/photo.png")]);
    }

    #[test]
    fn test_per_file_delegates() {
        let batch = PerFile(Rotate::new(Quarter::Ccw270));
        assert_eq!(batch.name(), "rotate");
        assert_eq!(batch.describe(), "rotate(270)");

        let items = batch.plan(&[ImageRef::from_path("/d/a.png"), ImageRef::from_path("/d/b.bmp")]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].inputs, items[0].outputs);

        let out = batch.render(vec![Raster::Luma(GrayImage::new(3, 1))]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dimensions(), (1, 3));
    }
}
