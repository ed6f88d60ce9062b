//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

fn check_kernel(name: &str, size: u32) -> Result<(), ConfigError> {
    if size == 0 || size % 2 == 0 {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be odd and >= 1 (got {size})"
        )));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.resize.max_width == 0 || self.resize.max_height == 0 {
            return Err(ConfigError::ValidationError(
                "resize.max_width and resize.max_height must be > 0".into(),
            ));
        }
        check_kernel("filter.median_kernel", self.filter.median_kernel)?;
        check_kernel("filter.mean_kernel", self.filter.mean_kernel)?;
        check_kernel("filter.gaussian_kernel_x", self.filter.gaussian_kernel_x)?;
        check_kernel("filter.gaussian_kernel_y", self.filter.gaussian_kernel_y)?;
        if self.filter.gaussian_sigma < 0.0 {
            return Err(ConfigError::ValidationError(
                "filter.gaussian_sigma must be >= 0".into(),
            ));
        }
        if self.noise.sigma.is_nan() || self.noise.sigma < 0.0 {
            return Err(ConfigError::ValidationError(
                "noise.sigma must be >= 0".into(),
            ));
        }
        if self.labels.noise_size <= 0.0 || self.labels.compare_size <= 0.0 {
            return Err(ConfigError::ValidationError(
                "labels.noise_size and labels.compare_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_even_kernel() {
        let mut config = Config::default();
        config.filter.mean_kernel = 4;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("filter.mean_kernel"));
    }

    #[test]
    fn test_validate_rejects_zero_kernel() {
        let mut config = Config::default();
        config.filter.gaussian_kernel_y = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gaussian_kernel_y"));
    }

    #[test]
    fn test_validate_rejects_zero_resize_bound() {
        let mut config = Config::default();
        config.resize.max_height = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("resize"));
    }

    #[test]
    fn test_validate_rejects_negative_noise() {
        let mut config = Config::default();
        config.noise.sigma = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("noise.sigma"));

        config.noise.sigma = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_formats() {
        let mut config = Config::default();
        config.processing.supported_formats.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("supported_formats"));
    }
}
