//! Side-by-side strips for comparing images and result folders.

use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info_span};

use crate::batch::{BatchObserver, BatchResult, BatchTransformer, WorkItem};
use crate::error::{PipelineError, PipelineResult};
use crate::label::{LabelColor, Labeler};
use crate::pipeline::encode::OUTPUT_EXTENSION;
use crate::pipeline::RasterWriter;
use crate::raster::{ColorSpace, Raster};
use crate::workdir;

/// Default number of images in a contact sheet.
pub const DEFAULT_SHEET_LIMIT: usize = 10;

/// Layout of a concatenated strip.
#[derive(Debug, Clone)]
pub struct ConcatOptions {
    /// Color space every image is converted to
    pub color_space: ColorSpace,
    /// Scale images to a common height (the smallest one, or `height`)
    pub same_height: bool,
    /// Force every image to this width
    pub width: Option<u32>,
    /// Force every image to this height, keeping aspect ratio unless `width` is set
    pub height: Option<u32>,
    /// Label text height in pixels
    pub label_size: f32,
    /// Label position inside each image
    pub label_pos: (i32, i32),
    pub label_color: LabelColor,
}

impl Default for ConcatOptions {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::Rgb,
            same_height: true,
            width: None,
            height: None,
            label_size: 30.0,
            label_pos: (10, 10),
            label_color: LabelColor::CAPTION,
        }
    }
}

impl ConcatOptions {
    /// Per-image size after the height/width policy, or `None` to keep it.
    fn target_size(&self, (w, h): (u32, u32), min_height: u32, uniform: bool) -> Option<(u32, u32)> {
        let same_height = self.same_height || self.height.is_some();
        if !((!uniform && same_height) || self.height.is_some() || self.width.is_some()) {
            return None;
        }
        let target_h = self.height.unwrap_or(min_height);
        let scaled = |num: u32, a: u32, b: u32| -> u32 {
            ((u64::from(num) * u64::from(a)) / u64::from(b.max(1))).max(1) as u32
        };
        Some(match self.width {
            Some(width) if same_height => (width, target_h),
            Some(width) => (width, scaled(h, width, w)),
            None => (scaled(w, target_h, h), target_h),
        })
    }
}

/// Paste `images` left to right, labelling each one when a labeler is given
/// and there is exactly one label per image.
pub fn concat(
    images: &[Raster],
    labels: &[String],
    options: &ConcatOptions,
    labeler: Option<&Labeler>,
) -> PipelineResult<Raster> {
    if images.is_empty() {
        return Err(PipelineError::invalid("concat", "no images to concatenate"));
    }
    if options.width == Some(0) || options.height == Some(0) {
        return Err(PipelineError::invalid("concat", "forced sizes must be > 0"));
    }

    let min_height = images.iter().map(Raster::height).min().unwrap_or(0);
    let uniform = images.iter().all(|im| im.height() == min_height);
    let mut tiles: Vec<Raster> = images
        .iter()
        .map(|im| {
            let converted = im.convert(options.color_space);
            match options.target_size(im.dimensions(), min_height, uniform) {
                Some((w, h)) if (w, h) != im.dimensions() => {
                    converted.resized(w, h, FilterType::Lanczos3)
                }
                _ => converted,
            }
        })
        .collect();

    if let Some(labeler) = labeler {
        if labels.len() == tiles.len() {
            for (tile, text) in tiles.iter_mut().zip(labels) {
                labeler.draw(
                    tile,
                    text,
                    options.label_pos,
                    options.label_size,
                    options.label_color,
                );
            }
        }
    }

    let total_width = tiles.iter().map(Raster::width).sum();
    let max_height = tiles.iter().map(Raster::height).max().unwrap_or(0);
    let mut canvas = Raster::blank(options.color_space, total_width, max_height);
    let mut x_offset = 0i64;
    for tile in &tiles {
        canvas.paste(tile, x_offset, 0);
        x_offset += i64::from(tile.width());
    }
    Ok(canvas)
}

/// For every file in the first directory, concatenate its counterparts from
/// all `dirs` (labelled by directory name) into `<out_dir>/<stem>.png`.
///
/// A counterpart is the first file, by name, starting with the same stem.
pub fn compare_folders(
    transformer: &BatchTransformer,
    dirs: &[PathBuf],
    out_dir: &Path,
    options: &ConcatOptions,
    labeler: Option<&Labeler>,
    observer: &mut dyn BatchObserver,
) -> PipelineResult<BatchResult> {
    let span = info_span!("compare", dirs = dirs.len(), out = %out_dir.display());
    let _enter = span.enter();

    let first = dirs
        .first()
        .ok_or_else(|| PipelineError::invalid("compare", "no directories to compare"))?;
    let listings = dirs
        .iter()
        .map(|d| workdir::list_files(d))
        .collect::<PipelineResult<Vec<_>>>()?;
    workdir::ensure_dir(out_dir)?;
    let labels: Vec<String> = dirs.iter().map(|d| file_name(d)).collect();

    let start = Instant::now();
    let names = workdir::list_file_names(first)?;
    observer.started("compare", names.len());

    let mut result = BatchResult::default();
    for (index, name) in names.iter().enumerate() {
        let stem = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        let item = WorkItem {
            inputs: vec![first.join(name)],
            outputs: vec![out_dir.join(format!("{stem}.{OUTPUT_EXTENSION}"))],
        };
        observer.item_started(index, &item);

        let outcome = counterparts(dirs, &listings, &stem).and_then(|paths| {
            let images = paths
                .iter()
                .map(|p| transformer.decoder().decode(p).map(|d| d.raster))
                .collect::<PipelineResult<Vec<_>>>()?;
            let strip = concat(&images, &labels, options, labeler)?;
            RasterWriter::write(&strip, &item.outputs[0])
        });

        match outcome {
            Ok(output) => {
                observer.item_succeeded(&item, std::slice::from_ref(&output));
                result.record_success([output]);
            }
            Err(e) => {
                observer.item_failed(&item, &e);
                result.record_failure(item.path(), &e);
                if transformer.options().strict {
                    result.elapsed = start.elapsed();
                    observer.finished(&result);
                    return Err(e);
                }
            }
        }
    }

    result.elapsed = start.elapsed();
    observer.finished(&result);
    Ok(result)
}

/// The first `limit` supported images of `dir`, labelled by file name.
pub fn contact_sheet(
    transformer: &BatchTransformer,
    dir: &Path,
    limit: usize,
    options: &ConcatOptions,
    labeler: Option<&Labeler>,
) -> PipelineResult<Raster> {
    if !dir.is_dir() {
        return Err(PipelineError::NotADirectory(dir.to_path_buf()));
    }
    let files: Vec<_> = transformer.discover(dir).into_iter().take(limit).collect();
    debug!(dir = %dir.display(), count = files.len(), "Building contact sheet");

    let images = files
        .iter()
        .map(|f| transformer.decoder().decode(&f.path).map(|d| d.raster))
        .collect::<PipelineResult<Vec<_>>>()?;
    let labels: Vec<String> = files.iter().map(|f| f.file_name()).collect();
    concat(&images, &labels, options, labeler)
}

/// First file in each listing whose name starts with `stem`.
fn counterparts(dirs: &[PathBuf], listings: &[Vec<PathBuf>], stem: &str) -> PipelineResult<Vec<PathBuf>> {
    dirs.iter()
        .zip(listings)
        .map(|(dir, files)| {
            files
                .iter()
                .find(|p| file_name(p).starts_with(stem))
                .cloned()
                .ok_or_else(|| PipelineError::MissingComponent(dir.join(format!("{stem}*"))))
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SilentObserver;
    use crate::config::Config;
    use crate::error::ErrorKind;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn gray(w: u32, h: u32, value: u8) -> Raster {
        Raster::Luma(GrayImage::from_pixel(w, h, Luma([value])))
    }

    #[test]
    fn test_concat_width_is_sum_of_widths() {
        let strip = concat(&[gray(3, 4, 10), gray(5, 4, 200)], &[], &ConcatOptions::default(), None)
            .unwrap();
        assert_eq!(strip.dimensions(), (8, 4));
        assert_eq!(strip.color_space(), ColorSpace::Rgb);

        let rgb = strip.to_rgb();
        assert_eq!(rgb.get_pixel(2, 0), &Rgb([10, 10, 10]));
        assert_eq!(rgb.get_pixel(3, 0), &Rgb([200, 200, 200]));
    }

    #[test]
    fn test_concat_scales_to_smallest_height() {
        let strip = concat(&[gray(4, 4, 0), gray(8, 8, 0)], &[], &ConcatOptions::default(), None)
            .unwrap();
        assert_eq!(strip.dimensions(), (8, 4));
    }

    #[test]
    fn test_concat_without_same_height_pads() {
        let options = ConcatOptions {
            same_height: false,
            color_space: ColorSpace::Luma,
            ..ConcatOptions::default()
        };
        let strip = concat(&[gray(4, 4, 9), gray(2, 6, 9)], &[], &options, None).unwrap();
        assert_eq!(strip.dimensions(), (6, 6));
        // Below the shorter tile the canvas stays black.
        assert_eq!(strip.to_luma().get_pixel(0, 5), &Luma([0]));
    }

    #[test]
    fn test_concat_forced_sizes() {
        let forced = ConcatOptions {
            width: Some(5),
            height: Some(3),
            ..ConcatOptions::default()
        };
        let strip = concat(&[gray(10, 10, 0), gray(4, 8, 0)], &[], &forced, None).unwrap();
        assert_eq!(strip.dimensions(), (10, 3));

        let width_only = ConcatOptions {
            width: Some(4),
            same_height: false,
            ..ConcatOptions::default()
        };
        let strip = concat(&[gray(8, 4, 0), gray(2, 4, 0)], &[], &width_only, None).unwrap();
        assert_eq!(strip.dimensions(), (8, 8));
    }

    #[test]
    fn test_concat_empty_rejected() {
        assert!(concat(&[], &[], &ConcatOptions::default(), None).is_err());
    }

    #[test]
    fn test_compare_folders() {
        let root = tempfile::tempdir().unwrap();
        let (a, b, out) = (root.path().join("a"), root.path().join("b"), root.path().join("out"));
        workdir::ensure_dir(&a).unwrap();
        workdir::ensure_dir(&b).unwrap();
        let tile = Raster::Rgb(RgbImage::new(4, 4));
        RasterWriter::write(&tile, &a.join("x.png")).unwrap();
        RasterWriter::write(&tile, &a.join("y.png")).unwrap();
        RasterWriter::write(&tile, &b.join("x_denoised.png")).unwrap();

        let transformer = BatchTransformer::new(&Config::default());
        let result = compare_folders(
            &transformer,
            &[a, b],
            &out,
            &ConcatOptions::default(),
            None,
            &mut SilentObserver,
        )
        .unwrap();

        assert_eq!(result.attempted, 2);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failures[0].kind, ErrorKind::MissingComponent);
        let strip = image::open(out.join("x.png")).unwrap();
        assert_eq!((strip.width(), strip.height()), (8, 4));
        assert!(!out.join("y.png").exists());
    }

    #[test]
    fn test_compare_folders_draws_labels() {
        let root = tempfile::tempdir().unwrap();
        let (a, b, out) = (root.path().join("a"), root.path().join("b"), root.path().join("out"));
        workdir::ensure_dir(&a).unwrap();
        workdir::ensure_dir(&b).unwrap();
        let tile = Raster::Rgb(RgbImage::new(60, 50));
        RasterWriter::write(&tile, &a.join("x.png")).unwrap();
        RasterWriter::write(&tile, &b.join("x.png")).unwrap();

        let labeler = crate::label::fixture_labeler();
        let result = compare_folders(
            &BatchTransformer::new(&Config::default()),
            &[a, b],
            &out,
            &ConcatOptions::default(),
            Some(&labeler),
            &mut SilentObserver,
        )
        .unwrap();

        assert!(result.is_clean());
        let strip = image::open(out.join("x.png")).unwrap().to_rgb8();
        assert_eq!(strip.dimensions(), (120, 50));
        // Caption color is light steel blue; each half carries its own label.
        let lit = |x0: u32, x1: u32| {
            strip
                .enumerate_pixels()
                .filter(|(x, _, _)| (x0..x1).contains(x))
                .any(|(_, _, px)| px.0[2] > px.0[0] && px.0[2] > 100)
        };
        assert!(lit(0, 60));
        assert!(lit(60, 120));
    }

    #[test]
    fn test_contact_sheet_respects_limit() {
        let root = tempfile::tempdir().unwrap();
        for i in 0..4 {
            RasterWriter::write(&gray(3, 3, i * 10), &root.path().join(format!("{i}.png"))).unwrap();
        }
        std::fs::write(root.path().join("notes.txt"), b"skip me").unwrap();

        let transformer = BatchTransformer::new(&Config::default());
        let sheet =
            contact_sheet(&transformer, root.path(), 3, &ConcatOptions::default(), None).unwrap();
        assert_eq!(sheet.dimensions(), (9, 3));
    }
}
