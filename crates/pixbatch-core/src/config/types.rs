//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Which files a batch considers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Supported input extensions (case-insensitive)
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: [
                "png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp", "gif", "pnm", "ppm", "pgm",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 20000,
        }
    }
}

/// Batch behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Abort on the first failed file and return its error
    pub strict: bool,
}

/// Bounds for resize-if-larger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            max_width: 1000,
            max_height: 1000,
        }
    }
}

/// Blur kernel defaults. Kernel sizes must be odd.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub median_kernel: u32,

    pub mean_kernel: u32,

    /// Gaussian kernel width
    pub gaussian_kernel_x: u32,

    /// Gaussian kernel height
    pub gaussian_kernel_y: u32,

    /// Gaussian standard deviation; 0 derives it from the kernel size
    pub gaussian_sigma: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            median_kernel: 5,
            mean_kernel: 3,
            gaussian_kernel_x: 5,
            gaussian_kernel_y: 5,
            gaussian_sigma: 0.0,
        }
    }
}

/// Additive Gaussian noise defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Standard deviation in 8-bit intensity units
    pub sigma: f32,

    /// Fixed RNG seed for reproducible noise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            seed: None,
        }
    }
}

/// Text overlay settings for noise labels and comparison strips.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// TrueType/OpenType font file (supports ~)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,

    /// Label height in pixels for noise labels
    pub noise_size: f32,

    /// Label height in pixels for comparison strips
    pub compare_size: f32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            noise_size: 40.0,
            compare_size: 30.0,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
