//! Conversion profiles for different use cases

use serde::{Deserialize, Serialize};

use crate::config::ImageFormat;
use crate::error::{FastConvertError, Result};

/// A conversion profile defines how images should be converted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionProfile {
    /// Target output format
    pub format: ImageFormat,

    /// Output quality (1-100)
    pub quality: u8,

    /// File naming configuration
    pub naming: NamingConfig,
}

impl ConversionProfile {
    /// Create a new profile targeting `format`
    pub fn to_format(format: ImageFormat) -> Self {
        Self {
            format,
            quality: 90,
            naming: NamingConfig::default(),
        }
    }

    /// Set the output quality
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the naming configuration
    pub fn naming(mut self, naming: NamingConfig) -> Self {
        self.naming = naming;
        self
    }

    /// Validate the profile configuration
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(FastConvertError::invalid_parameters(format!(
                "Quality must be between 1-100, got {}",
                self.quality
            )));
        }

        self.naming.validate()
    }
}

/// File naming configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NamingConfig {
    /// Prefix to add to filenames
    pub prefix: Option<String>,

    /// Suffix to add to filenames (before extension)
    pub suffix: Option<String>,
}

impl NamingConfig {
    /// Generate output filename for a given input, swapping the extension
    /// for the target format's
    pub fn generate_filename(&self, input_name: &str, format: ImageFormat) -> String {
        let stem = match input_name.rfind('.') {
            Some(dot_pos) => &input_name[..dot_pos],
            None => input_name,
        };

        let mut new_name = String::new();

        if let Some(prefix) = &self.prefix {
            new_name.push_str(prefix);
        }

        new_name.push_str(stem);

        if let Some(suffix) = &self.suffix {
            new_name.push_str(suffix);
        }

        new_name.push('.');
        new_name.push_str(format.extension());

        new_name
    }

    /// Validate naming configuration
    pub fn validate(&self) -> Result<()> {
        for part in [&self.prefix, &self.suffix].into_iter().flatten() {
            if part.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|']) {
                return Err(FastConvertError::invalid_parameters(
                    "Prefix/suffix contains invalid filename characters",
                ));
            }
        }

        Ok(())
    }
}

/// Predefined conversion profiles for common use cases
pub struct Profiles;

impl Profiles {
    /// Web delivery: WebP at a size-friendly quality
    pub fn web() -> ConversionProfile {
        ConversionProfile::to_format(ImageFormat::WebP).quality(85)
    }

    /// Archival: lossless PNG
    pub fn archive() -> ConversionProfile {
        ConversionProfile::to_format(ImageFormat::Png).quality(100)
    }

    /// Maximum compatibility: high-quality JPEG
    pub fn compat() -> ConversionProfile {
        ConversionProfile::to_format(ImageFormat::Jpeg).quality(90)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_builders() {
        let profile = ConversionProfile::to_format(ImageFormat::WebP).quality(70);
        assert_eq!(profile.format, ImageFormat::WebP);
        assert_eq!(profile.quality, 70);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_quality_bounds() {
        assert!(ConversionProfile::to_format(ImageFormat::Png)
            .quality(0)
            .validate()
            .is_err());
        assert!(ConversionProfile::to_format(ImageFormat::Png)
            .quality(101)
            .validate()
            .is_err());
    }

    #[test]
    fn test_filename_generation() {
        let naming = NamingConfig::default();
        assert_eq!(
            naming.generate_filename("photo.jpg", ImageFormat::WebP),
            "photo.webp"
        );

        let decorated = NamingConfig {
            prefix: Some("out_".to_string()),
            suffix: Some("_converted".to_string()),
        };
        assert_eq!(
            decorated.generate_filename("photo.png", ImageFormat::Jpeg),
            "out_photo_converted.jpg"
        );
    }

    #[test]
    fn test_filename_without_extension() {
        let naming = NamingConfig::default();
        assert_eq!(
            naming.generate_filename("photo", ImageFormat::Png),
            "photo.png"
        );
    }

    #[test]
    fn test_invalid_naming_characters() {
        let naming = NamingConfig {
            prefix: Some("bad/prefix".to_string()),
            suffix: None,
        };
        assert!(naming.validate().is_err());
    }

    #[test]
    fn test_predefined_profiles() {
        assert_eq!(Profiles::web().format, ImageFormat::WebP);
        assert_eq!(Profiles::archive().format, ImageFormat::Png);
        assert_eq!(Profiles::compat().format, ImageFormat::Jpeg);
        assert!(Profiles::web().validate().is_ok());
    }
}
