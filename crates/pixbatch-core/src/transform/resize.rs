//! Downscale images that exceed a bounding box.

use image::imageops::FilterType;

use crate::error::{PipelineError, PipelineResult};
use crate::raster::Raster;

use super::Transform;

/// Shrink to fit within `max_width` x `max_height`, keeping the aspect ratio.
///
/// Images already inside the bounds are returned unchanged, so applying the
/// transform twice gives the same result as applying it once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeIfLarger {
    pub max_width: u32,
    pub max_height: u32,
}

impl ResizeIfLarger {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Output dimensions for an input of `width` x `height`.
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if width <= self.max_width && height <= self.max_height {
            return (width, height);
        }
        let scale = (f64::from(self.max_width) / f64::from(width))
            .min(f64::from(self.max_height) / f64::from(height));
        let w = (f64::from(width) * scale).round() as u32;
        let h = (f64::from(height) * scale).round() as u32;
        (w.clamp(1, self.max_width), h.clamp(1, self.max_height))
    }
}

impl Transform for ResizeIfLarger {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn describe(&self) -> String {
        format!("resize(<= {}x{})", self.max_width, self.max_height)
    }

    fn validate(&self) -> PipelineResult<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(PipelineError::invalid(
                "resize",
                format!(
                    "bounds must be positive (got {}x{})",
                    self.max_width, self.max_height
                ),
            ));
        }
        Ok(())
    }

    fn apply(&self, raster: &Raster) -> PipelineResult<Raster> {
        let (width, height) = raster.dimensions();
        let (w, h) = self.target_dimensions(width, height);
        if (w, h) == (width, height) {
            return Ok(raster.clone());
        }
        tracing::trace!("resize {}x{} -> {}x{}", width, height, w, h);
        Ok(raster.resized(w, h, FilterType::Lanczos3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbImage};

    #[test]
    fn test_within_bounds_is_noop() {
        let raster = Raster::Luma(GrayImage::new(800, 600));
        let out = ResizeIfLarger::new(1000, 1000).transform(&raster).unwrap();
        assert_eq!(out, raster);
    }

    #[test]
    fn test_landscape_keeps_aspect() {
        let resize = ResizeIfLarger::new(1000, 1000);
        assert_eq!(resize.target_dimensions(3000, 2000), (1000, 667));
        assert_eq!(resize.target_dimensions(2000, 3000), (667, 1000));
    }

    #[test]
    fn test_one_axis_over_bound() {
        let resize = ResizeIfLarger::new(100, 100);
        assert_eq!(resize.target_dimensions(50, 400), (13, 100));
    }

    #[test]
    fn test_extreme_aspect_never_zero() {
        let resize = ResizeIfLarger::new(10, 10);
        assert_eq!(resize.target_dimensions(10_000, 1), (10, 1));
    }

    #[test]
    fn test_idempotent() {
        let resize = ResizeIfLarger::new(64, 48);
        let raster = Raster::Rgb(RgbImage::from_fn(301, 97, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 7])
        }));
        let once = resize.transform(&raster).unwrap();
        let twice = resize.transform(&once).unwrap();
        assert_eq!(once, twice);
        assert!(once.width() <= 64 && once.height() <= 48);
    }

    #[test]
    fn test_zero_bound_rejected() {
        let raster = Raster::Luma(GrayImage::new(4, 4));
        assert!(ResizeIfLarger::new(0, 10).transform(&raster).is_err());
    }
}
