//! Stateless raster transforms.
//!
//! Every one-to-one operation implements [`Transform`]. Batches wrap them in
//! [`PerFile`](crate::batch::PerFile); shape-changing operations (channel
//! split/merge) implement [`BatchTransform`](crate::batch::BatchTransform)
//! directly.

pub mod average;
pub mod channels;
pub mod color;
pub mod filter;
pub mod noise;
pub mod resize;
pub mod rotate;

pub use average::{average, average_files};
pub use channels::{merge_channels, split_channels, MergeChannels, SplitChannels};
pub use color::Normalize;
pub use filter::{GaussianBlur, MeanBlur, MedianBlur};
pub use noise::{AddNoise, NoiseLabel};
pub use resize::ResizeIfLarger;
pub use rotate::{Quarter, Rotate};

use crate::error::{PipelineError, PipelineResult};
use crate::raster::{ColorSpace, Raster};

/// A pure raster-to-raster operation.
pub trait Transform: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Human-readable description including parameters.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Color spaces this transform takes as input.
    fn accepts(&self) -> &'static [ColorSpace] {
        ColorSpace::ALL
    }

    /// Check parameters without touching any pixels.
    fn validate(&self) -> PipelineResult<()> {
        Ok(())
    }

    /// Apply to a raster whose color space is in [`accepts`](Self::accepts).
    fn apply(&self, raster: &Raster) -> PipelineResult<Raster>;

    /// Validate, check the input color space, then apply.
    fn transform(&self, raster: &Raster) -> PipelineResult<Raster> {
        self.validate()?;
        let color_space = raster.color_space();
        if !self.accepts().contains(&color_space) {
            return Err(PipelineError::UnsupportedColorSpace {
                transform: self.name(),
                color_space,
            });
        }
        self.apply(raster)
    }
}

impl<T: Transform + ?Sized> Transform for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn accepts(&self) -> &'static [ColorSpace] {
        (**self).accepts()
    }

    fn validate(&self) -> PipelineResult<()> {
        (**self).validate()
    }

    fn apply(&self, raster: &Raster) -> PipelineResult<Raster> {
        (**self).apply(raster)
    }
}

/// Several transforms applied in order.
#[derive(Default)]
pub struct Chain {
    steps: Vec<Box<dyn Transform>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn then(mut self, step: impl Transform + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Transform for Chain {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn describe(&self) -> String {
        if self.steps.is_empty() {
            return "identity".to_string();
        }
        self.steps
            .iter()
            .map(|s| s.describe())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    fn validate(&self) -> PipelineResult<()> {
        self.steps.iter().try_for_each(|s| s.validate())
    }

    fn apply(&self, raster: &Raster) -> PipelineResult<Raster> {
        let mut current = raster.clone();
        for step in &self.steps {
            current = step.transform(&current)?;
        }
        Ok(current)
    }
}

/// Reject kernel sizes that are even or zero.
pub(crate) fn check_kernel(transform: &'static str, size: u32) -> PipelineResult<()> {
    if size == 0 || size % 2 == 0 {
        return Err(PipelineError::invalid(
            transform,
            format!("kernel size must be odd and >= 1 (got {size})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbaImage};

    struct LumaOnly;

    impl Transform for LumaOnly {
        fn name(&self) -> &'static str {
            "luma_only"
        }

        fn accepts(&self) -> &'static [ColorSpace] {
            &[ColorSpace::Luma]
        }

        fn apply(&self, raster: &Raster) -> PipelineResult<Raster> {
            Ok(raster.clone())
        }
    }

    #[test]
    fn test_transform_rejects_unaccepted_color_space() {
        let err = LumaOnly
            .transform(&Raster::Rgba(RgbaImage::new(2, 2)))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnsupportedColorSpace {
                color_space: ColorSpace::Rgba,
                ..
            }
        ));
        assert!(LumaOnly.transform(&Raster::Luma(GrayImage::new(2, 2))).is_ok());
    }

    #[test]
    fn test_chain_applies_in_order() {
        let chain = Chain::new()
            .then(Rotate::new(Quarter::Ccw90))
            .then(Normalize::new(ColorSpace::Luma));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.describe(), "rotate(90) -> normalize(luma)");

        let raster = Raster::Rgba(RgbaImage::new(4, 2));
        let out = chain.transform(&raster).unwrap();
        assert_eq!(out.color_space(), ColorSpace::Luma);
        assert_eq!(out.dimensions(), (2, 4));
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let mut img = GrayImage::new(3, 3);
        img.put_pixel(1, 1, Luma([200]));
        let raster = Raster::Luma(img);

        let chain = Chain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.transform(&raster).unwrap(), raster);
    }

    #[test]
    fn test_chain_validate_surfaces_bad_step() {
        let chain = Chain::new().then(MedianBlur::new(4));
        let err = chain.validate().unwrap_err();
        assert!(err.to_string().contains("odd"));
    }

    #[test]
    fn test_check_kernel() {
        assert!(check_kernel("t", 1).is_ok());
        assert!(check_kernel("t", 7).is_ok());
        assert!(check_kernel("t", 0).is_err());
        assert!(check_kernel("t", 6).is_err());
    }
}
