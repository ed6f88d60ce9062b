//! Additive Gaussian noise, optionally stamped with its sigma.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::label::{LabelColor, Labeler};
use crate::raster::Raster;

use super::Transform;

/// Text overlay settings for [`AddNoise`].
#[derive(Debug, Clone)]
pub struct NoiseLabel {
    pub labeler: Arc<Labeler>,
    /// Text height in pixels
    pub size: f32,
}

/// Add zero-mean Gaussian noise with standard deviation `sigma`.
///
/// Samples are clipped to [0, 255] and truncated. Alpha is left untouched.
/// With a `seed`, the same input always receives the same noise; the seed is
/// mixed with the pixel data so different images get different noise.
#[derive(Debug, Clone)]
pub struct AddNoise {
    pub sigma: f32,
    pub seed: Option<u64>,
    pub label: Option<NoiseLabel>,
}

impl AddNoise {
    pub fn new(sigma: f32) -> Self {
        Self {
            sigma,
            seed: None,
            label: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_label(mut self, labeler: Arc<Labeler>, size: f32) -> Self {
        self.label = Some(NoiseLabel { labeler, size });
        self
    }

    fn rng(&self, raster: &Raster) -> StdRng {
        match self.seed {
            Some(seed) => {
                let mut hasher = DefaultHasher::new();
                seed.hash(&mut hasher);
                raster.dimensions().hash(&mut hasher);
                raster.samples().hash(&mut hasher);
                StdRng::seed_from_u64(hasher.finish())
            }
            None => StdRng::from_entropy(),
        }
    }
}

/// One standard normal sample (Box-Muller).
fn standard_normal<R: Rng>(rng: &mut R) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

impl Transform for AddNoise {
    fn name(&self) -> &'static str {
        "add_noise"
    }

    fn describe(&self) -> String {
        format!("noise(sigma={})", self.sigma)
    }

    fn validate(&self) -> PipelineResult<()> {
        if self.sigma.is_nan() || self.sigma < 0.0 {
            return Err(PipelineError::invalid(
                "add_noise",
                format!("sigma must be >= 0 (got {})", self.sigma),
            ));
        }
        Ok(())
    }

    fn apply(&self, raster: &Raster) -> PipelineResult<Raster> {
        let mut rng = self.rng(raster);
        let sigma = self.sigma;
        let mut noisy = raster.map_samples(|src, dst, _w, _h, channels| {
            for (i, (d, s)) in dst.iter_mut().zip(src).enumerate() {
                if channels == 4 && i % 4 == 3 {
                    continue;
                }
                let value = f32::from(*s) + sigma * standard_normal(&mut rng);
                *d = value.clamp(0.0, 255.0) as u8;
            }
        });

        if let Some(label) = &self.label {
            let text = format!("sigma = {}", self.sigma);
            label
                .labeler
                .draw(&mut noisy, &text, (10, 10), label.size, LabelColor::NOISE);
        }
        Ok(noisy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn flat(value: u8) -> Raster {
        Raster::Luma(GrayImage::from_pixel(32, 32, Luma([value])))
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let raster = flat(100);
        let out = AddNoise::new(0.0).transform(&raster).unwrap();
        assert_eq!(out, raster);
    }

    #[test]
    fn test_seeded_noise_is_deterministic() {
        let raster = flat(128);
        let noise = AddNoise::new(15.0).with_seed(7);
        let a = noise.transform(&raster).unwrap();
        let b = noise.transform(&raster).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, raster);
    }

    #[test]
    fn test_seeded_noise_differs_between_images() {
        let noise = AddNoise::new(15.0).with_seed(7);
        let a = noise.transform(&flat(100)).unwrap();
        let b = noise.transform(&flat(101)).unwrap();
        let offsets_a: Vec<i16> = a.samples().iter().map(|&v| i16::from(v) - 100).collect();
        let offsets_b: Vec<i16> = b.samples().iter().map(|&v| i16::from(v) - 101).collect();
        assert_ne!(offsets_a, offsets_b);
    }

    #[test]
    fn test_values_are_clipped() {
        let out = AddNoise::new(200.0).with_seed(1).transform(&flat(250)).unwrap();
        let samples = out.samples();
        assert!(samples.iter().any(|&v| v == 255));
        assert!(samples.iter().any(|&v| v < 250));
    }

    #[test]
    fn test_noise_statistics() {
        let out = AddNoise::new(10.0).with_seed(42).transform(&flat(128)).unwrap();
        let samples = out.samples();
        let n = samples.len() as f64;
        let mean = samples.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let var = samples
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / n;
        // Truncation biases the mean down by about half a level.
        assert!((mean - 127.5).abs() < 2.0, "mean {mean}");
        assert!((var.sqrt() - 10.0).abs() < 2.0, "std {}", var.sqrt());
    }

    #[test]
    fn test_alpha_untouched() {
        let raster = Raster::Rgba(RgbaImage::from_pixel(8, 8, Rgba([50, 60, 70, 99])));
        let out = AddNoise::new(30.0).with_seed(3).transform(&raster).unwrap();
        assert!(out.samples().chunks(4).all(|px| px[3] == 99));
    }

    #[test]
    fn test_negative_sigma_rejected() {
        let err = AddNoise::new(-1.0).transform(&flat(0)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Transform);
    }

    #[test]
    fn test_label_is_drawn_in_red() {
        let raster = Raster::Rgb(image::RgbImage::from_pixel(120, 40, image::Rgb([90, 90, 90])));
        let labeler = Arc::new(crate::label::fixture_labeler());
        let out = AddNoise::new(0.0)
            .with_label(labeler, 16.0)
            .transform(&raster)
            .unwrap();
        assert_ne!(out, raster);
        assert!(out.samples().chunks(3).any(|px| px[0] > 150 && px[1] < 60));
    }
}
