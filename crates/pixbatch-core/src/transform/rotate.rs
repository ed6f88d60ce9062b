//! Lossless quarter-turn rotation.

use image::imageops;

use crate::error::PipelineResult;
use crate::raster::Raster;

use super::Transform;

/// Counter-clockwise quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quarter {
    /// 90 degrees counter-clockwise
    Ccw90,
    /// 270 degrees counter-clockwise (90 clockwise)
    Ccw270,
}

impl Quarter {
    /// The rotation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Quarter::Ccw90 => Quarter::Ccw270,
            Quarter::Ccw270 => Quarter::Ccw90,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Quarter::Ccw90 => 90,
            Quarter::Ccw270 => 270,
        }
    }
}

/// Rotate by a quarter turn. Exact, no resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotate {
    pub quarter: Quarter,
}

impl Rotate {
    pub fn new(quarter: Quarter) -> Self {
        Self { quarter }
    }
}

impl Transform for Rotate {
    fn name(&self) -> &'static str {
        "rotate"
    }

    fn describe(&self) -> String {
        format!("rotate({})", self.quarter.degrees())
    }

    fn apply(&self, raster: &Raster) -> PipelineResult<Raster> {
        // imageops rotates clockwise
        let out = match (self.quarter, raster) {
            (Quarter::Ccw90, Raster::Luma(b)) => Raster::Luma(imageops::rotate270(b)),
            (Quarter::Ccw90, Raster::Rgb(b)) => Raster::Rgb(imageops::rotate270(b)),
            (Quarter::Ccw90, Raster::Rgba(b)) => Raster::Rgba(imageops::rotate270(b)),
            (Quarter::Ccw270, Raster::Luma(b)) => Raster::Luma(imageops::rotate90(b)),
            (Quarter::Ccw270, Raster::Rgb(b)) => Raster::Rgb(imageops::rotate90(b)),
            (Quarter::Ccw270, Raster::Rgba(b)) => Raster::Rgba(imageops::rotate90(b)),
        };
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn gradient() -> Raster {
        Raster::Rgba(RgbaImage::from_fn(5, 3, |x, y| {
            Rgba([x as u8 * 40, y as u8 * 60, (x + y) as u8, 255 - x as u8])
        }))
    }

    #[test]
    fn test_ccw90_moves_top_right_to_top_left() {
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(2, 0, Luma([255]));
        let out = Rotate::new(Quarter::Ccw90)
            .transform(&Raster::Luma(img))
            .unwrap();
        assert_eq!(out.dimensions(), (2, 3));
        match out {
            Raster::Luma(b) => assert_eq!(b.get_pixel(0, 0), &Luma([255])),
            other => panic!("unexpected {}", other.color_space()),
        }
    }

    #[test]
    fn test_rotate_then_inverse_is_identity() {
        let raster = gradient();
        let quarter = Quarter::Ccw90;
        let turned = Rotate::new(quarter).transform(&raster).unwrap();
        let back = Rotate::new(quarter.inverse()).transform(&turned).unwrap();
        assert_eq!(back, raster);
    }

    #[test]
    fn test_four_quarter_turns_is_identity() {
        let raster = gradient();
        let rotate = Rotate::new(Quarter::Ccw270);
        let mut current = raster.clone();
        for _ in 0..4 {
            current = rotate.transform(&current).unwrap();
        }
        assert_eq!(current, raster);
    }
}
