//! Color-space normalization.

use crate::error::{PipelineError, PipelineResult};
use crate::raster::{ColorSpace, Raster};

use super::Transform;

/// Convert every image to grayscale or RGB, dropping alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalize {
    pub target: ColorSpace,
}

impl Normalize {
    pub fn new(target: ColorSpace) -> Self {
        Self { target }
    }

    pub fn grayscale() -> Self {
        Self::new(ColorSpace::Luma)
    }

    pub fn rgb() -> Self {
        Self::new(ColorSpace::Rgb)
    }
}

impl Transform for Normalize {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn describe(&self) -> String {
        format!("normalize({})", self.target)
    }

    fn validate(&self) -> PipelineResult<()> {
        if self.target == ColorSpace::Rgba {
            return Err(PipelineError::invalid(
                "normalize",
                "target must be luma or rgb; normalization always drops alpha",
            ));
        }
        Ok(())
    }

    fn apply(&self, raster: &Raster) -> PipelineResult<Raster> {
        Ok(raster.convert(self.target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    #[test]
    fn test_rgba_to_rgb_drops_alpha() {
        let raster = Raster::Rgba(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        let out = Normalize::rgb().transform(&raster).unwrap();
        match out {
            Raster::Rgb(img) => assert_eq!(img.get_pixel(0, 0), &Rgb([1, 2, 3])),
            other => panic!("expected rgb, got {}", other.color_space()),
        }
    }

    #[test]
    fn test_grayscale_target() {
        let raster = Raster::Rgba(RgbaImage::new(3, 1));
        let out = Normalize::grayscale().transform(&raster).unwrap();
        assert_eq!(out.color_space(), ColorSpace::Luma);
        assert_eq!(out.dimensions(), (3, 1));
    }

    #[test]
    fn test_rgba_target_rejected() {
        let raster = Raster::Rgba(RgbaImage::new(1, 1));
        let err = Normalize::new(ColorSpace::Rgba)
            .transform(&raster)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Transform);
    }
}
