//! FastConvert - High-Performance Batch Image Converter
//!
//! A fast, memory-aware library for batch image format conversion.
//! Designed for automation workflows, CI/CD pipelines, and processing
//! large volumes of images.
//!
//! # Features
//!
//! - **Bounded Parallelism**: continuously-refilling worker pool with a
//!   hard cap on in-flight conversions
//! - **Failure Isolation**: one corrupt file never aborts the batch
//! - **Deterministic Ordering**: results keep input order regardless of
//!   completion order
//! - **Format Support**: JPEG, PNG, WebP, GIF, TIFF, BMP
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use fastconvert::{
//!     run_batch, BatchConfig, ConversionEngine, ConvertConfig, ImageFormat,
//! };
//!
//! # tokio_test::block_on(async {
//! let engine = Arc::new(ConversionEngine::new());
//! let config = ConvertConfig::new(ImageFormat::WebP).quality(85);
//!
//! let files = vec![PathBuf::from("photo.jpg")];
//! let op = move |input: PathBuf| {
//!     let engine = Arc::clone(&engine);
//!     let config = config.clone();
//!     async move {
//!         let output = input.with_extension(config.format.extension());
//!         engine.convert_file(&input, &output, &config).await
//!     }
//! };
//!
//! let result = run_batch(files, op, BatchConfig::new().concurrency(4)).await;
//! println!("{}/{} converted", result.successful, result.total);
//! # });
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod error;
pub mod processing;
pub mod report;

// Re-export commonly used types
pub use batch::{
    chunk, recommend_concurrency, run_batch, with_timeout, BatchConfig, BatchObserver,
    BatchResult, ErrorRecord, FixedParallelism, ParallelismProvider, ProgressBarObserver,
    SizingOptions, SystemParallelism, TaskOutcome, TraceObserver,
};
pub use config::{Config, ConversionProfile, ConvertConfig, ImageFormat};
pub use error::{FastConvertError, Result};
pub use processing::{discover_files, ConversionEngine, ConversionResult};
pub use report::BatchReport;

use tracing::{info, warn};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the FastConvert library with default settings
///
/// This sets up logging and logs basic host capabilities. Should be called
/// once at program start.
pub fn init() -> Result<()> {
    // Initialize tracing subscriber if not already set
    if tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .finish(),
    )
    .is_ok()
    {
        info!("FastConvert v{} initialized", VERSION);
    }

    log_system_capabilities();

    Ok(())
}

/// Initialize with custom configuration
pub fn init_with_config(config: &Config) -> Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(config.logging.level.as_str())
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("FastConvert v{} initialized with custom config", VERSION);
    }

    log_system_capabilities();

    Ok(())
}

fn log_system_capabilities() {
    use sysinfo::{System, SystemExt};

    let mut system = System::new();
    system.refresh_memory();

    let available_memory = system.available_memory();
    const MIN_MEMORY_MB: u64 = 256;

    if available_memory < MIN_MEMORY_MB * 1024 * 1024 {
        warn!(
            "Low available memory: {}MB (recommended: >{}MB)",
            available_memory / (1024 * 1024),
            MIN_MEMORY_MB
        );
    }

    info!(
        "Detected {} parallel-execution units, {:.2} GB memory available",
        SystemParallelism.available_parallelism(),
        available_memory as f64 / 1024.0 / 1024.0 / 1024.0
    );
}
