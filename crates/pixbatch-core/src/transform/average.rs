//! Weighted per-pixel average of several images.

use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{ImageDecoder, RasterWriter};
use crate::raster::Raster;

/// Average `images` with `weights`, normalized to sum to one.
///
/// Every input is converted to RGB first and all must share dimensions.
/// Results are rounded to the nearest integer.
pub fn average(images: &[Raster], weights: &[f64]) -> PipelineResult<Raster> {
    if images.is_empty() {
        return Err(PipelineError::invalid("average", "no images to average"));
    }
    if weights.len() != images.len() {
        return Err(PipelineError::invalid(
            "average",
            format!(
                "got {} weight(s) for {} image(s)",
                weights.len(),
                images.len()
            ),
        ));
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(PipelineError::invalid(
            "average",
            format!("weights must be finite and >= 0 (got {bad})"),
        ));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(PipelineError::invalid("average", "weights sum to zero"));
    }

    let planes: Vec<RgbImage> = images.iter().map(Raster::to_rgb).collect();
    let expected = planes[0].dimensions();
    if let Some(mismatch) = planes.iter().find(|p| p.dimensions() != expected) {
        return Err(PipelineError::DimensionMismatch {
            expected,
            found: mismatch.dimensions(),
        });
    }

    let mut acc = vec![0f64; planes[0].as_raw().len()];
    for (plane, weight) in planes.iter().zip(weights) {
        let w = weight / total;
        for (a, s) in acc.iter_mut().zip(plane.as_raw()) {
            *a += w * f64::from(*s);
        }
    }
    let samples: Vec<u8> = acc
        .into_iter()
        .map(|v| v.round().clamp(0.0, 255.0) as u8)
        .collect();

    let (width, height) = expected;
    RgbImage::from_raw(width, height, samples)
        .map(Raster::Rgb)
        .ok_or_else(|| PipelineError::invalid("average", "sample buffer has the wrong length"))
}

/// Decode `inputs`, average them and write the result to `output`.
///
/// Equal weights are used when `weights` is `None`.
pub fn average_files(
    decoder: &ImageDecoder,
    inputs: &[PathBuf],
    weights: Option<&[f64]>,
    output: &Path,
) -> PipelineResult<PathBuf> {
    let rasters = inputs
        .iter()
        .map(|path| decoder.decode(path).map(|d| d.raster))
        .collect::<PipelineResult<Vec<_>>>()?;
    let equal;
    let weights = match weights {
        Some(w) => w,
        None => {
            equal = vec![1.0; rasters.len()];
            &equal
        }
    };
    debug!(inputs = inputs.len(), output = %output.display(), "Averaging images");
    let averaged = average(&rasters, weights)?;
    RasterWriter::write(&averaged, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use crate::error::ErrorKind;
    use image::{GrayImage, Luma, Rgb};

    fn rgb(value: [u8; 3]) -> Raster {
        Raster::Rgb(RgbImage::from_pixel(4, 4, Rgb(value)))
    }

    #[test]
    fn test_equal_weights_on_identical_images() {
        let image = Raster::Rgb(RgbImage::from_fn(5, 3, |x, y| {
            Rgb([x as u8 * 40, y as u8 * 60, 17])
        }));
        let out = average(&[image.clone(), image.clone()], &[1.0, 1.0]).unwrap();
        for (o, i) in out.samples().iter().zip(image.samples()) {
            assert!(o.abs_diff(*i) <= 1);
        }
    }

    #[test]
    fn test_weights_are_normalized() {
        let out = average(&[rgb([0, 0, 0]), rgb([200, 100, 40])], &[1.0, 3.0]).unwrap();
        assert_eq!(&out.samples()[..3], &[150, 75, 30]);
    }

    #[test]
    fn test_gray_inputs_become_rgb() {
        let gray = Raster::Luma(GrayImage::from_pixel(4, 4, Luma([90])));
        let out = average(&[gray, rgb([10, 10, 10])], &[1.0, 1.0]).unwrap();
        assert_eq!(out.color_space(), crate::raster::ColorSpace::Rgb);
        assert_eq!(&out.samples()[..3], &[50, 50, 50]);
    }

    #[test]
    fn test_bad_weights_rejected() {
        let images = [rgb([1, 1, 1]), rgb([2, 2, 2])];
        for weights in [&[1.0, -1.0][..], &[0.0, 0.0], &[1.0], &[f64::NAN, 1.0]] {
            let err = average(&images, weights).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Transform);
        }
        assert!(average(&[], &[]).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        let small = Raster::Rgb(RgbImage::new(2, 2));
        let err = average(&[rgb([0, 0, 0]), small], &[1.0, 1.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[test]
    fn test_average_files_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        RasterWriter::write(&rgb([0, 0, 0]), &a).unwrap();
        RasterWriter::write(&rgb([100, 100, 100]), &b).unwrap();

        let out = dir.path().join("avg.png");
        let decoder = ImageDecoder::new(LimitsConfig::default());
        average_files(&decoder, &[a, b], None, &out).unwrap();

        let back = image::open(&out).unwrap().into_rgb8();
        assert_eq!(back.get_pixel(0, 0), &Rgb([50, 50, 50]));
    }
}
