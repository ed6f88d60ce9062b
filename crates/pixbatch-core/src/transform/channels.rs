//! RGB channel split (1 -> 3 files) and merge (3 -> 1 file).

use image::{GrayImage, Luma, RgbImage};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::batch::{BatchTransform, WorkItem};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::encode::{suffixed_path, OUTPUT_EXTENSION};
use crate::pipeline::ImageRef;
use crate::raster::Raster;

/// File-name suffixes of the red, green and blue component images.
pub const CHANNEL_SUFFIXES: [&str; 3] = ["_red", "_green", "_blue"];

/// Split into three single-channel images, each replicated into RGB.
///
/// Alpha is removed first.
pub fn split_channels(raster: &Raster) -> [Raster; 3] {
    let rgb = raster.to_rgb();
    [0, 1, 2].map(|channel| {
        let plane = GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            Luma([rgb.get_pixel(x, y).0[channel]])
        });
        Raster::Rgb(Raster::Luma(plane).to_rgb())
    })
}

/// Merge red, green and blue components, each read as grayscale.
pub fn merge_channels(red: &Raster, green: &Raster, blue: &Raster) -> PipelineResult<Raster> {
    let planes = [red.to_luma(), green.to_luma(), blue.to_luma()];
    let expected = planes[0].dimensions();
    if let Some(mismatch) = planes.iter().find(|p| p.dimensions() != expected) {
        return Err(PipelineError::DimensionMismatch {
            expected,
            found: mismatch.dimensions(),
        });
    }
    let (width, height) = expected;
    Ok(Raster::Rgb(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            planes[0].get_pixel(x, y).0[0],
            planes[1].get_pixel(x, y).0[0],
            planes[2].get_pixel(x, y).0[0],
        ])
    })))
}

/// Replace every image with its `_red`, `_green` and `_blue` components.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitChannels;

impl BatchTransform for SplitChannels {
    fn name(&self) -> &'static str {
        "split_channels"
    }

    fn plan(&self, files: &[ImageRef]) -> Vec<WorkItem> {
        files
            .iter()
            .map(|f| WorkItem {
                inputs: vec![f.path.clone()],
                outputs: CHANNEL_SUFFIXES
                    .iter()
                    .map(|suffix| suffixed_path(&f.path, suffix))
                    .collect(),
            })
            .collect()
    }

    fn render(&self, inputs: Vec<Raster>) -> PipelineResult<Vec<Raster>> {
        let [input] = expect_inputs::<1>(self.name(), inputs)?;
        Ok(split_channels(&input).into())
    }
}

/// Recombine `<stem>_red.png`, `<stem>_green.png`, `<stem>_blue.png` into `<stem>.png`.
///
/// One item is planned per stem with at least one component present; any
/// absent sibling fails that item with [`PipelineError::MissingComponent`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeChannels;

impl MergeChannels {
    /// `dir/stem` shared by the three components, if `path` is one of them.
    fn component_base(path: &Path) -> Option<PathBuf> {
        let name = path.file_name()?.to_str()?;
        let stem = CHANNEL_SUFFIXES.iter().find_map(|suffix| {
            name.strip_suffix(&format!("{suffix}.{OUTPUT_EXTENSION}"))
                .filter(|stem| !stem.is_empty())
        })?;
        Some(path.with_file_name(stem))
    }

    fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
        let mut name = base.as_os_str().to_owned();
        name.push(format!("{suffix}.{OUTPUT_EXTENSION}"));
        PathBuf::from(name)
    }
}

impl BatchTransform for MergeChannels {
    fn name(&self) -> &'static str {
        "merge_channels"
    }

    fn plan(&self, files: &[ImageRef]) -> Vec<WorkItem> {
        let bases: BTreeSet<PathBuf> = files
            .iter()
            .filter_map(|f| Self::component_base(&f.path))
            .collect();
        bases
            .iter()
            .map(|base| WorkItem {
                inputs: CHANNEL_SUFFIXES
                    .iter()
                    .map(|suffix| Self::with_suffix(base, suffix))
                    .collect(),
                outputs: vec![Self::with_suffix(base, "")],
            })
            .collect()
    }

    fn render(&self, inputs: Vec<Raster>) -> PipelineResult<Vec<Raster>> {
        let [red, green, blue] = expect_inputs::<3>(self.name(), inputs)?;
        Ok(vec![merge_channels(&red, &green, &blue)?])
    }
}

fn expect_inputs<const N: usize>(
    transform: &'static str,
    inputs: Vec<Raster>,
) -> PipelineResult<[Raster; N]> {
    let count = inputs.len();
    inputs.try_into().map_err(|_| {
        PipelineError::invalid(transform, format!("expected {N} input(s), got {count}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    fn sample() -> Raster {
        Raster::Rgba(RgbaImage::from_fn(4, 3, |x, y| {
            Rgba([x as u8 * 50, y as u8 * 70, 200 - x as u8 * 10, 128])
        }))
    }

    #[test]
    fn test_split_produces_replicated_planes() {
        let [r, g, b] = split_channels(&sample());
        for plane in [&r, &g, &b] {
            assert_eq!(plane.color_space(), crate::raster::ColorSpace::Rgb);
            assert_eq!(plane.dimensions(), (4, 3));
        }
        match &g {
            Raster::Rgb(img) => assert_eq!(img.get_pixel(1, 2), &Rgb([140, 140, 140])),
            other => panic!("unexpected {}", other.color_space()),
        }
    }

    #[test]
    fn test_merge_of_split_recovers_rgb() {
        let input = sample();
        let [r, g, b] = split_channels(&input);
        let merged = merge_channels(&r, &g, &b).unwrap();
        let expected = input.to_rgb();
        assert_eq!(merged.dimensions(), expected.dimensions());
        for (m, e) in merged.samples().iter().zip(expected.as_raw()) {
            assert!(m.abs_diff(*e) <= 1, "{m} vs {e}");
        }
    }

    #[test]
    fn test_merge_dimension_mismatch() {
        let a = Raster::Luma(GrayImage::new(4, 4));
        let b = Raster::Luma(GrayImage::new(4, 5));
        let err = merge_channels(&a, &a, &b).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DimensionMismatch {
                expected: (4, 4),
                found: (4, 5)
            }
        ));
    }

    #[test]
    fn test_split_plan_names() {
        let items = SplitChannels.plan(&[ImageRef::from_path("/d/photo.jpg")]);
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].outputs,
            vec![
                PathBuf::from("/d/photo_red.png"),
                PathBuf::from("/d/photo_green.png"),
                PathBuf::from("/d/photo_blue.png"),
            ]
        );
    }

    #[test]
    fn test_merge_plan_one_item_per_stem() {
        let files = [
            ImageRef::from_path("/d/a_blue.png"),
            ImageRef::from_path("/d/a_green.png"),
            ImageRef::from_path("/d/a_red.png"),
            ImageRef::from_path("/d/other.png"),
            ImageRef::from_path("/d/_red.png"),
        ];
        let items = MergeChannels.plan(&files);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].inputs[1], PathBuf::from("/d/a_green.png"));
        assert_eq!(items[0].outputs, vec![PathBuf::from("/d/a.png")]);
    }

    #[test]
    fn test_merge_plan_without_red_component() {
        let files = [
            ImageRef::from_path("/d/x_blue.png"),
            ImageRef::from_path("/d/x_green.png"),
        ];
        let items = MergeChannels.plan(&files);
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].inputs,
            vec![
                PathBuf::from("/d/x_red.png"),
                PathBuf::from("/d/x_green.png"),
                PathBuf::from("/d/x_blue.png"),
            ]
        );
        assert_eq!(items[0].outputs, vec![PathBuf::from("/d/x.png")]);
    }

    #[test]
    fn test_render_rejects_wrong_arity() {
        let err = MergeChannels
            .render(vec![Raster::Luma(GrayImage::new(1, 1))])
            .unwrap_err();
        assert!(err.to_string().contains("expected 3 input(s), got 1"));
    }
}
