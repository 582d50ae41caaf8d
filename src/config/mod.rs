//! Configuration management for FastConvert

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FastConvertError, Result};

pub mod profiles;
pub use profiles::*;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Conversion profiles for different use cases
    pub profiles: HashMap<String, ConversionProfile>,

    /// Global processing settings
    pub processing: ProcessingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        let mut profiles = HashMap::new();

        // Default web profile
        profiles.insert("web".to_string(), Profiles::web());

        // Default archive profile
        profiles.insert("archive".to_string(), Profiles::archive());

        // Default compatibility profile
        profiles.insert("compat".to_string(), Profiles::compat());

        Self {
            profiles,
            processing: ProcessingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Global processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Number of concurrent conversions (None = auto-detect)
    pub concurrency: Option<usize>,

    /// Estimated memory cost per concurrent conversion, in bytes, used to
    /// cap the auto-detected concurrency on memory-starved hosts
    pub memory_per_item: Option<u64>,

    /// Enable recursive directory processing
    pub recursive: bool,

    /// Maximum file size to process (in bytes)
    pub max_file_size: u64,

    /// Processing timeout per file (in seconds, 0 = no timeout)
    pub timeout_seconds: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            concurrency: None, // Auto-detect
            memory_per_item: None,
            recursive: false,
            max_file_size: 100 * 1024 * 1024, // 100MB
            timeout_seconds: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,

    /// Log file path (None = stdout)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file: None,
        }
    }
}

/// Target settings for one conversion operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Target output format
    pub format: ImageFormat,

    /// Output quality (1-100, ignored by lossless formats)
    pub quality: u8,
}

impl ConvertConfig {
    /// Create a configuration targeting `format` at default quality
    pub fn new(format: ImageFormat) -> Self {
        Self {
            format,
            quality: 90,
        }
    }

    /// Set the output quality
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Validate the conversion parameters
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(FastConvertError::invalid_parameters(format!(
                "Quality must be between 1-100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Supported image formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Tiff,
    Bmp,
}

impl ImageFormat {
    /// Get file extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
        }
    }

    /// Get MIME type for this format
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            FastConvertError::config(format!(
                "Failed to read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(FastConvertError::config(
                "Unsupported config file format. Use .toml or .yaml",
            )),
        }
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let content = match extension.to_lowercase().as_str() {
            "toml" => toml::to_string_pretty(self).map_err(|e| {
                FastConvertError::config(format!("TOML serialization failed: {}", e))
            })?,
            "yaml" | "yml" => serde_yaml::to_string(self).map_err(|e| {
                FastConvertError::config(format!("YAML serialization failed: {}", e))
            })?,
            _ => {
                return Err(FastConvertError::config(
                    "Unsupported config file format. Use .toml or .yaml",
                ))
            }
        };

        std::fs::write(&path, content).map_err(|e| {
            FastConvertError::config(format!(
                "Failed to write config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get a conversion profile by name
    pub fn get_profile(&self, name: &str) -> Result<&ConversionProfile> {
        self.profiles.get(name).ok_or_else(|| {
            FastConvertError::config(format!(
                "Profile '{}' not found. Available profiles: {:?}",
                name,
                self.profiles.keys().collect::<Vec<_>>()
            ))
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, profile) in &self.profiles {
            profile
                .validate()
                .map_err(|e| FastConvertError::config(format!("Invalid profile '{}': {}", name, e)))?;
        }

        if let Some(concurrency) = self.processing.concurrency {
            if concurrency == 0 {
                return Err(FastConvertError::config(
                    "Concurrency must be greater than 0",
                ));
            }
        }

        if self.processing.max_file_size == 0 {
            return Err(FastConvertError::config(
                "Maximum file size must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.profiles.contains_key("web"));
        assert!(config.profiles.contains_key("archive"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();

        // Test TOML
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.profiles.len(), parsed.profiles.len());

        // Test YAML
        let yaml_str = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml_str).unwrap();
        assert_eq!(config.profiles.len(), parsed.profiles.len());
    }

    #[test]
    fn test_config_file_io() {
        let config = Config::default();

        // Test TOML file
        let toml_file = NamedTempFile::new().unwrap();
        let toml_path = toml_file.path().with_extension("toml");
        config.to_file(&toml_path).unwrap();
        let loaded = Config::from_file(&toml_path).unwrap();
        assert!(loaded.validate().is_ok());

        // Test YAML file
        let yaml_file = NamedTempFile::new().unwrap();
        let yaml_path = yaml_file.path().with_extension("yaml");
        config.to_file(&yaml_path).unwrap();
        let loaded = Config::from_file(&yaml_path).unwrap();
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_image_format_properties() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(ImageFormat::WebP.mime_type(), "image/webp");
    }

    #[test]
    fn test_profile_lookup() {
        let config = Config::default();
        assert!(config.get_profile("web").is_ok());
        assert!(config.get_profile("nonexistent").is_err());
    }

    #[test]
    fn test_convert_config_validation() {
        assert!(ConvertConfig::new(ImageFormat::WebP).validate().is_ok());
        assert!(ConvertConfig::new(ImageFormat::Jpeg)
            .quality(0)
            .validate()
            .is_err());
        assert!(ConvertConfig::new(ImageFormat::Jpeg)
            .quality(101)
            .validate()
            .is_err());
    }

    #[test]
    fn test_invalid_concurrency_rejected() {
        let mut config = Config::default();
        config.processing.concurrency = Some(0);
        assert!(config.validate().is_err());
    }
}
