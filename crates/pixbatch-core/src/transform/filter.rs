//! Median, mean and Gaussian blurs.
//!
//! All three run on `imageproc` filters: `median_filter` for the median and
//! `separable_filter` for the mean and Gaussian kernels. Borders replicate
//! the edge pixel. All channels, alpha included, are filtered.

use imageproc::filter::{median_filter, separable_filter};

use crate::error::PipelineResult;
use crate::raster::Raster;

use super::{check_kernel, Transform};

/// Median filter over a square `kernel` x `kernel` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedianBlur {
    pub kernel: u32,
}

impl MedianBlur {
    pub fn new(kernel: u32) -> Self {
        Self { kernel }
    }
}

impl Transform for MedianBlur {
    fn name(&self) -> &'static str {
        "median_blur"
    }

    fn describe(&self) -> String {
        format!("median({})", self.kernel)
    }

    fn validate(&self) -> PipelineResult<()> {
        check_kernel("median_blur", self.kernel)
    }

    fn apply(&self, raster: &Raster) -> PipelineResult<Raster> {
        let radius = self.kernel / 2;
        if radius == 0 {
            return Ok(raster.clone());
        }
        let out = match raster {
            Raster::Luma(b) => Raster::Luma(median_filter(b, radius, radius)),
            Raster::Rgb(b) => Raster::Rgb(median_filter(b, radius, radius)),
            Raster::Rgba(b) => Raster::Rgba(median_filter(b, radius, radius)),
        };
        Ok(out)
    }
}

/// Box filter: every output pixel is the mean of its `kernel` x `kernel` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeanBlur {
    pub kernel: u32,
}

impl MeanBlur {
    pub fn new(kernel: u32) -> Self {
        Self { kernel }
    }
}

impl Transform for MeanBlur {
    fn name(&self) -> &'static str {
        "mean_blur"
    }

    fn describe(&self) -> String {
        format!("mean({})", self.kernel)
    }

    fn validate(&self) -> PipelineResult<()> {
        check_kernel("mean_blur", self.kernel)
    }

    fn apply(&self, raster: &Raster) -> PipelineResult<Raster> {
        if self.kernel == 1 {
            return Ok(raster.clone());
        }
        let weights = box_kernel(self.kernel);
        Ok(convolve(raster, &weights, &weights))
    }
}

/// Gaussian blur with independent kernel sizes per axis.
///
/// A non-positive `sigma` is derived from each axis' kernel size as
/// `0.3 * ((k - 1) * 0.5 - 1) + 0.8`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBlur {
    pub kernel_x: u32,
    pub kernel_y: u32,
    pub sigma: f32,
}

impl GaussianBlur {
    pub fn new(kernel_x: u32, kernel_y: u32, sigma: f32) -> Self {
        Self {
            kernel_x,
            kernel_y,
            sigma,
        }
    }

    /// Normalized 1-D kernel for one axis.
    pub fn kernel(size: u32, sigma: f32) -> Vec<f32> {
        let sigma = if sigma > 0.0 {
            sigma
        } else {
            0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
        };
        let center = (size / 2) as f32;
        let mut weights: Vec<f32> = (0..size)
            .map(|i| {
                let d = i as f32 - center;
                (-(d * d) / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }
        weights
    }
}

impl Transform for GaussianBlur {
    fn name(&self) -> &'static str {
        "gaussian_blur"
    }

    fn describe(&self) -> String {
        format!(
            "gaussian({}x{}, sigma={})",
            self.kernel_x, self.kernel_y, self.sigma
        )
    }

    fn validate(&self) -> PipelineResult<()> {
        check_kernel("gaussian_blur", self.kernel_x)?;
        check_kernel("gaussian_blur", self.kernel_y)?;
        if self.sigma.is_nan() {
            return Err(crate::error::PipelineError::invalid(
                "gaussian_blur",
                "sigma must be a number",
            ));
        }
        Ok(())
    }

    fn apply(&self, raster: &Raster) -> PipelineResult<Raster> {
        let kx = Self::kernel(self.kernel_x, self.sigma);
        let ky = Self::kernel(self.kernel_y, self.sigma);
        Ok(convolve(raster, &kx, &ky))
    }
}

fn box_kernel(size: u32) -> Vec<f32> {
    vec![1.0 / size as f32; size as usize]
}

/// Horizontal pass with `kx`, then vertical pass with `ky`.
fn convolve(raster: &Raster, kx: &[f32], ky: &[f32]) -> Raster {
    match raster {
        Raster::Luma(b) => Raster::Luma(separable_filter(b, kx, ky)),
        Raster::Rgb(b) => Raster::Rgb(separable_filter(b, kx, ky)),
        Raster::Rgba(b) => Raster::Rgba(separable_filter(b, kx, ky)),
    }
}
