//! Basic single-file conversion example

use std::path::Path;

use fastconvert::{init, ConversionEngine, ConvertConfig, ImageFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the library
    init()?;

    let engine = ConversionEngine::new();
    let config = ConvertConfig::new(ImageFormat::WebP).quality(85);

    let result = engine
        .convert_file(Path::new("input.jpg"), Path::new("output.webp"), &config)
        .await?;

    println!(
        "Converted {} -> {} ({} -> {} bytes, {:.1}x smaller)",
        result.input_path.display(),
        result.output_path.display(),
        result.original.file_size,
        result.output.file_size,
        result.compression_ratio()
    );

    Ok(())
}
