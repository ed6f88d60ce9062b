//! Text overlays for noise labels and comparison strips.

use ab_glyph::{FontVec, PxScale};
use image::{Luma, Rgb, Rgba};
use imageproc::drawing::draw_text_mut;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::raster::Raster;

/// Label color, with the gray level used on single-channel images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelColor {
    pub rgb: [u8; 3],
    pub gray: u8,
}

impl LabelColor {
    /// Red on color images, near-white on gray.
    pub const NOISE: LabelColor = LabelColor {
        rgb: [255, 0, 0],
        gray: 240,
    };

    /// Light steel blue on color images, near-white on gray.
    pub const CAPTION: LabelColor = LabelColor {
        rgb: [176, 196, 222],
        gray: 240,
    };

    /// Use the same color everywhere, with gray from Rec. 601 luma.
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        let [r, g, b] = rgb.map(f32::from);
        let gray = (0.299 * r + 0.587 * g + 0.114 * b).round() as u8;
        Self { rgb, gray }
    }
}

/// Draws text with a TrueType/OpenType font loaded from disk.
pub struct Labeler {
    font: FontVec,
}

impl std::fmt::Debug for Labeler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Labeler").finish_non_exhaustive()
    }
}

impl Labeler {
    /// Load a font file.
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
        Self::from_bytes(bytes).map_err(|e| match e {
            PipelineError::InvalidParameter { transform, message } => {
                PipelineError::InvalidParameter {
                    transform,
                    message: format!("{}: {}", path.display(), message),
                }
            }
            other => other,
        })
    }

    /// Parse font data already in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> PipelineResult<Self> {
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| PipelineError::invalid("label", format!("cannot parse font: {e}")))?;
        Ok(Self { font })
    }

    /// Draw `text` with its top-left corner at `pos`, `size` pixels tall.
    pub fn draw(&self, raster: &mut Raster, text: &str, pos: (i32, i32), size: f32, color: LabelColor) {
        let scale = PxScale::from(size);
        let (x, y) = pos;
        let [r, g, b] = color.rgb;
        match raster {
            Raster::Luma(img) => draw_text_mut(img, Luma([color.gray]), x, y, scale, &self.font, text),
            Raster::Rgb(img) => draw_text_mut(img, Rgb([r, g, b]), x, y, scale, &self.font, text),
            Raster::Rgba(img) => {
                draw_text_mut(img, Rgba([r, g, b, 255]), x, y, scale, &self.font, text)
            }
        }
    }
}

/// Error used when a label is requested but no font is configured.
pub fn missing_font(transform: &'static str) -> PipelineError {
    PipelineError::invalid(
        transform,
        "labels need a font; set labels.font_path in the config",
    )
}

/// Labeler backed by the font checked in under `tests/fixtures`.
#[cfg(test)]
pub(crate) fn fixture_labeler() -> Labeler {
    let bytes = include_bytes!("../tests/fixtures/DejaVuSansMono.ttf");
    Labeler::from_bytes(bytes.to_vec()).unwrap()
}
