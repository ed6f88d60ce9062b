//! In-memory raster buffers over a closed set of color spaces.

use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, GrayImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Color spaces a [`Raster`] can hold. All are 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// Single-channel grayscale
    Luma,
    /// Three-channel RGB
    Rgb,
    /// RGB with alpha
    Rgba,
}

impl ColorSpace {
    /// Every supported color space.
    pub const ALL: &'static [ColorSpace] = &[ColorSpace::Luma, ColorSpace::Rgb, ColorSpace::Rgba];

    /// Number of samples per pixel.
    pub fn channels(self) -> usize {
        match self {
            ColorSpace::Luma => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Rgba => 4,
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSpace::Luma => write!(f, "luma"),
            ColorSpace::Rgb => write!(f, "rgb"),
            ColorSpace::Rgba => write!(f, "rgba"),
        }
    }
}

impl FromStr for ColorSpace {
    type Err = String;

    /// Parse a color space name (case-insensitive). `l`/`gray` map to luma.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "l" | "luma" | "gray" | "grey" | "grayscale" => Ok(ColorSpace::Luma),
            "rgb" => Ok(ColorSpace::Rgb),
            "rgba" => Ok(ColorSpace::Rgba),
            other => Err(format!("unknown color space: {other}")),
        }
    }
}

/// A decoded pixel grid.
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    Luma(GrayImage),
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl Raster {
    /// Wrap a decoded image, mapping wide or float layouts onto 8-bit spaces.
    ///
    /// Gray+alpha becomes RGBA so the alpha channel is not silently lost.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        match image.color() {
            ColorType::L8 | ColorType::L16 => Raster::Luma(image.into_luma8()),
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => {
                Raster::Rgb(image.into_rgb8())
            }
            _ => Raster::Rgba(image.into_rgba8()),
        }
    }

    /// Convert back into an `image` crate value for encoding.
    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            Raster::Luma(b) => DynamicImage::ImageLuma8(b),
            Raster::Rgb(b) => DynamicImage::ImageRgb8(b),
            Raster::Rgba(b) => DynamicImage::ImageRgba8(b),
        }
    }

    /// A black (transparent for RGBA) canvas.
    pub fn blank(color_space: ColorSpace, width: u32, height: u32) -> Self {
        match color_space {
            ColorSpace::Luma => Raster::Luma(GrayImage::new(width, height)),
            ColorSpace::Rgb => Raster::Rgb(RgbImage::new(width, height)),
            ColorSpace::Rgba => Raster::Rgba(RgbaImage::new(width, height)),
        }
    }

    pub fn color_space(&self) -> ColorSpace {
        match self {
            Raster::Luma(_) => ColorSpace::Luma,
            Raster::Rgb(_) => ColorSpace::Rgb,
            Raster::Rgba(_) => ColorSpace::Rgba,
        }
    }

    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Raster::Luma(b) => b.dimensions(),
            Raster::Rgb(b) => b.dimensions(),
            Raster::Rgba(b) => b.dimensions(),
        }
    }

    /// Interleaved samples, row-major.
    pub fn samples(&self) -> &[u8] {
        match self {
            Raster::Luma(b) => b.as_raw(),
            Raster::Rgb(b) => b.as_raw(),
            Raster::Rgba(b) => b.as_raw(),
        }
    }

    /// Copy as RGB. Alpha is dropped, gray is replicated.
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            Raster::Rgb(b) => b.clone(),
            other => other.clone().into_dynamic().into_rgb8(),
        }
    }

    /// Copy as grayscale. Alpha is dropped.
    pub fn to_luma(&self) -> GrayImage {
        match self {
            Raster::Luma(b) => b.clone(),
            other => other.clone().into_dynamic().into_luma8(),
        }
    }

    /// Copy as RGBA. Missing alpha becomes opaque.
    pub fn to_rgba(&self) -> RgbaImage {
        match self {
            Raster::Rgba(b) => b.clone(),
            other => other.clone().into_dynamic().into_rgba8(),
        }
    }

    /// Copy into another color space. Converting to RGBA adds an opaque alpha.
    pub fn convert(&self, target: ColorSpace) -> Raster {
        match target {
            ColorSpace::Luma => Raster::Luma(self.to_luma()),
            ColorSpace::Rgb => Raster::Rgb(self.to_rgb()),
            ColorSpace::Rgba => Raster::Rgba(self.to_rgba()),
        }
    }

    /// Resample to exactly `width` x `height`.
    pub fn resized(&self, width: u32, height: u32, filter: FilterType) -> Raster {
        match self {
            Raster::Luma(b) => Raster::Luma(imageops::resize(b, width, height, filter)),
            Raster::Rgb(b) => Raster::Rgb(imageops::resize(b, width, height, filter)),
            Raster::Rgba(b) => Raster::Rgba(imageops::resize(b, width, height, filter)),
        }
    }

    /// Copy `other` onto this raster with its top-left corner at (`x`, `y`).
    ///
    /// `other` is converted to this raster's color space; parts falling
    /// outside the canvas are clipped.
    pub fn paste(&mut self, other: &Raster, x: i64, y: i64) {
        match self {
            Raster::Luma(dst) => imageops::replace(dst, &other.to_luma(), x, y),
            Raster::Rgb(dst) => imageops::replace(dst, &other.to_rgb(), x, y),
            Raster::Rgba(dst) => imageops::replace(dst, &other.to_rgba(), x, y),
        }
    }

    /// Build a new raster of the same shape by writing into a copy of the samples.
    ///
    /// The closure receives the source samples, the destination samples,
    /// width, height and channel count.
    pub(crate) fn map_samples<F>(&self, f: F) -> Raster
    where
        F: FnOnce(&[u8], &mut [u8], u32, u32, usize),
    {
        let (width, height) = self.dimensions();
        let channels = self.color_space().channels();
        match self {
            Raster::Luma(b) => {
                let mut out = b.clone();
                let dst: &mut [u8] = &mut out;
                f(b.as_raw(), dst, width, height, channels);
                Raster::Luma(out)
            }
            Raster::Rgb(b) => {
                let mut out = b.clone();
                let dst: &mut [u8] = &mut out;
                f(b.as_raw(), dst, width, height, channels);
                Raster::Rgb(out)
            }
            Raster::Rgba(b) => {
                let mut out = b.clone();
                let dst: &mut [u8] = &mut out;
                f(b.as_raw(), dst, width, height, channels);
                Raster::Rgba(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba};

    #[test]
    fn test_from_dynamic_maps_color_spaces() {
        let gray = Raster::from_dynamic(DynamicImage::new_luma8(4, 4));
        assert_eq!(gray.color_space(), ColorSpace::Luma);

        let wide = Raster::from_dynamic(DynamicImage::new_rgb16(4, 4));
        assert_eq!(wide.color_space(), ColorSpace::Rgb);

        let gray_alpha = Raster::from_dynamic(DynamicImage::new_luma_a8(4, 4));
        assert_eq!(gray_alpha.color_space(), ColorSpace::Rgba);
    }

    #[test]
    fn test_to_rgb_drops_alpha() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 0]));
        let rgb = Raster::Rgba(img).to_rgb();
        assert_eq!(rgb.get_pixel(1, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_replicated_gray_to_luma() {
        let img = RgbImage::from_pixel(3, 3, Rgb([77, 77, 77]));
        let gray = Raster::Rgb(img).to_luma();
        assert!(gray.get_pixel(0, 0).0[0].abs_diff(77) <= 1);
    }

    #[test]
    fn test_color_space_parse() {
        assert_eq!("L".parse::<ColorSpace>().unwrap(), ColorSpace::Luma);
        assert_eq!("RGB".parse::<ColorSpace>().unwrap(), ColorSpace::Rgb);
        assert!("cmyk".parse::<ColorSpace>().is_err());
    }

    #[test]
    fn test_paste_converts_and_clips() {
        let mut canvas = Raster::blank(ColorSpace::Rgb, 4, 2);
        let tile = Raster::Luma(GrayImage::from_pixel(3, 3, image::Luma([50])));
        canvas.paste(&tile, 2, 0);

        let rgb = canvas.to_rgb();
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([0, 0, 0]));
        assert_eq!(rgb.get_pixel(2, 1), &Rgb([50, 50, 50]));
        assert_eq!(rgb.get_pixel(3, 1), &Rgb([50, 50, 50]));
    }

    #[test]
    fn test_map_samples_preserves_shape() {
        let raster = Raster::Rgb(RgbImage::from_pixel(5, 3, Rgb([1, 2, 3])));
        let mapped = raster.map_samples(|src, dst, w, h, c| {
            assert_eq!(src.len(), (w * h) as usize * c);
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s * 2;
            }
        });
        assert_eq!(mapped.dimensions(), (5, 3));
        assert_eq!(&mapped.samples()[..3], &[2, 4, 6]);
    }
}
