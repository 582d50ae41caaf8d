//! Core image conversion functionality

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::fs;
use tracing::debug;

use crate::config::{ConvertConfig, ImageFormat};
use crate::error::{ErrorContext, FastConvertError, Result};

pub mod discovery;
pub mod formats;

pub use discovery::*;
pub use formats::*;

/// Metadata about one image file
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub file_size: u64,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Result of converting a single file
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversionResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub original: ImageInfo,
    pub output: ImageInfo,
    pub duration: Duration,
}

impl ConversionResult {
    /// Byte-size ratio of input to output
    pub fn compression_ratio(&self) -> f64 {
        if self.output.file_size == 0 {
            return 1.0;
        }
        self.original.file_size as f64 / self.output.file_size as f64
    }
}

/// Core engine for image conversion operations
pub struct ConversionEngine {
    max_file_size: u64,
}

impl ConversionEngine {
    /// Create a new conversion engine with default limits
    pub fn new() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024, // 100MB
        }
    }

    /// Create an engine with an explicit input size ceiling
    pub fn with_max_file_size(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Convert a single file to the configured target format.
    ///
    /// Decoding and encoding run on the calling task; the engine performs
    /// file I/O through tokio and creates the output's parent directory if
    /// needed.
    pub async fn convert_file(
        &self,
        input_path: &Path,
        output_path: &Path,
        config: &ConvertConfig,
    ) -> Result<ConversionResult> {
        let started = Instant::now();
        config.validate()?;

        debug!("converting {:?} -> {:?}", input_path, output_path);

        let metadata = fs::metadata(input_path)
            .await
            .with_file_context(input_path.to_path_buf())?;
        let file_size = metadata.len();

        if file_size > self.max_file_size {
            return Err(FastConvertError::file_too_large(
                file_size,
                self.max_file_size,
                input_path.to_path_buf(),
            ));
        }

        let bytes = fs::read(input_path)
            .await
            .with_file_context(input_path.to_path_buf())?;

        let source_format = formats::detect_format(&bytes, input_path)?;
        let image =
            image::load_from_memory(&bytes).with_file_context(input_path.to_path_buf())?;

        let original = ImageInfo {
            format: source_format,
            file_size,
            width: image.width(),
            height: image.height(),
        };

        let encoded = formats::encode_image(&image, config.format, config.quality)?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_file_context(output_path.to_path_buf())?;
        }
        fs::write(output_path, &encoded)
            .await
            .with_file_context(output_path.to_path_buf())?;

        let output = ImageInfo {
            format: config.format,
            file_size: encoded.len() as u64,
            width: image.width(),
            height: image.height(),
        };

        Ok(ConversionResult {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            original,
            output,
            duration: started.elapsed(),
        })
    }
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_test_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let image = image::DynamicImage::new_rgb8(width, height);
        image.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_convert_png_to_jpeg() {
        let dir = TempDir::new().unwrap();
        let input = write_test_png(dir.path(), "in.png", 8, 6);
        let output = dir.path().join("out.jpg");

        let engine = ConversionEngine::new();
        let config = ConvertConfig::new(ImageFormat::Jpeg).quality(85);

        let result = engine.convert_file(&input, &output, &config).await.unwrap();

        assert!(output.exists());
        assert_eq!(result.original.format, ImageFormat::Png);
        assert_eq!(result.output.format, ImageFormat::Jpeg);
        assert_eq!(result.original.width, 8);
        assert_eq!(result.original.height, 6);
        assert!(result.output.file_size > 0);
    }

    #[tokio::test]
    async fn test_output_parent_dirs_are_created() {
        let dir = TempDir::new().unwrap();
        let input = write_test_png(dir.path(), "in.png", 4, 4);
        let output = dir.path().join("a/b/out.png");

        let engine = ConversionEngine::new();
        let config = ConvertConfig::new(ImageFormat::Png);

        engine.convert_file(&input, &output, &config).await.unwrap();
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_file_too_large_rejected() {
        let dir = TempDir::new().unwrap();
        let input = write_test_png(dir.path(), "in.png", 4, 4);
        let output = dir.path().join("out.jpg");

        let engine = ConversionEngine::with_max_file_size(10);
        let config = ConvertConfig::new(ImageFormat::Jpeg);

        let err = engine
            .convert_file(&input, &output, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, FastConvertError::FileTooLarge { .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_corrupt_input_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("fake.png");
        std::fs::write(&input, b"this is not an image").unwrap();
        let output = dir.path().join("out.jpg");

        let engine = ConversionEngine::new();
        let config = ConvertConfig::new(ImageFormat::Jpeg);

        let err = engine
            .convert_file(&input, &output, &config)
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_invalid_quality_rejected_before_io() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("missing.png");
        let output = dir.path().join("out.jpg");

        let engine = ConversionEngine::new();
        let config = ConvertConfig::new(ImageFormat::Jpeg).quality(0);

        let err = engine
            .convert_file(&input, &output, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, FastConvertError::InvalidParameters { .. }));
    }

    #[test]
    fn test_compression_ratio() {
        let info = |size| ImageInfo {
            format: ImageFormat::Png,
            file_size: size,
            width: 1,
            height: 1,
        };
        let result = ConversionResult {
            input_path: PathBuf::from("a"),
            output_path: PathBuf::from("b"),
            original: info(1000),
            output: info(250),
            duration: Duration::from_millis(1),
        };
        assert_eq!(result.compression_ratio(), 4.0);
    }
}
