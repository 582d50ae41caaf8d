//! Error types and handling for FastConvert

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for FastConvert operations
pub type Result<T> = std::result::Result<T, FastConvertError>;

/// Main error type for FastConvert operations
#[derive(Debug, Error)]
pub enum FastConvertError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File format not supported
    #[error("Unsupported image format: {format} (file: {file:?})")]
    UnsupportedFormat {
        format: String,
        file: Option<PathBuf>,
    },

    /// File size too large
    #[error("File too large: {size} bytes (limit: {limit} bytes, file: {file:?})")]
    FileTooLarge {
        size: u64,
        limit: u64,
        file: PathBuf,
    },

    /// Per-item operation timeout
    #[error("Operation timed out after {timeout:?} (file: {file:?})")]
    Timeout {
        timeout: Duration,
        file: Option<PathBuf>,
    },

    /// Invalid conversion parameters
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// File validation errors
    #[error("File validation failed: {message} (file: {file:?})")]
    ValidationError {
        message: String,
        file: Option<PathBuf>,
    },

    /// Batch scheduling errors
    #[error("Batch processing error: {message}")]
    BatchError { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),

    /// System resource errors
    #[error("System resource error: {message}")]
    SystemError { message: String },
}

impl FastConvertError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S, file: Option<PathBuf>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
            file,
        }
    }

    /// Create a new file too large error
    pub fn file_too_large(size: u64, limit: u64, file: PathBuf) -> Self {
        Self::FileTooLarge { size, limit, file }
    }

    /// Create a new timeout error
    pub fn timeout(timeout: Duration, file: Option<PathBuf>) -> Self {
        Self::Timeout { timeout, file }
    }

    /// Create a new invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S, file: Option<PathBuf>) -> Self {
        Self::ValidationError {
            message: message.into(),
            file,
        }
    }

    /// Create a new batch processing error
    pub fn batch<S: Into<String>>(message: S) -> Self {
        Self::BatchError {
            message: message.into(),
        }
    }

    /// Create a new system error
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::SystemError {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (processing can continue)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // These errors affect individual files but the batch can continue
            Self::IoError(_)
            | Self::ImageError(_)
            | Self::UnsupportedFormat { .. }
            | Self::FileTooLarge { .. }
            | Self::Timeout { .. }
            | Self::ValidationError { .. } => true,

            // These errors should stop all processing
            Self::ConfigError { .. }
            | Self::InvalidParameters { .. }
            | Self::BatchError { .. }
            | Self::SerdeError(_)
            | Self::SystemError { .. } => false,
        }
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::UnsupportedFormat { file, .. }
            | Self::Timeout { file, .. }
            | Self::ValidationError { file, .. } => file.as_ref(),

            Self::FileTooLarge { file, .. } => Some(file),

            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("File system error: {}", e),
            Self::ImageError(e) => format!("Image processing failed: {}", e),
            Self::UnsupportedFormat { format, .. } => {
                format!(
                    "Unsupported image format: {}. Supported formats: JPEG, PNG, WebP, GIF, TIFF, BMP",
                    format
                )
            }
            Self::FileTooLarge { size, limit, .. } => {
                format!(
                    "File is too large ({:.2} MB). Maximum supported: {:.2} MB",
                    *size as f64 / 1024.0 / 1024.0,
                    *limit as f64 / 1024.0 / 1024.0
                )
            }
            Self::Timeout { timeout, .. } => {
                format!(
                    "Processing took too long (>{:.1} seconds). Try a smaller file or raise the timeout.",
                    timeout.as_secs_f64()
                )
            }
            other => other.to_string(),
        }
    }
}

// Convert serde errors to our error type
impl From<toml::de::Error> for FastConvertError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for FastConvertError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {}", err))
    }
}

/// Error context extension for adding file path information
pub trait ErrorContext<T> {
    /// Add file context to an error
    fn with_file_context(self, file: PathBuf) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<FastConvertError>,
{
    fn with_file_context(self, file: PathBuf) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();

            // Add file context if not already present
            match &mut error {
                FastConvertError::UnsupportedFormat { file: ref mut f, .. }
                | FastConvertError::Timeout { file: ref mut f, .. }
                | FastConvertError::ValidationError { file: ref mut f, .. } => {
                    if f.is_none() {
                        *f = Some(file);
                    }
                }
                _ => {}
            }

            error
        })
    }
}
