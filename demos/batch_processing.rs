//! Batch conversion example with bounded parallelism

use std::path::PathBuf;
use std::sync::Arc;

use fastconvert::{
    init, run_batch, BatchConfig, ConversionEngine, ConvertConfig, ImageFormat,
    ProgressBarObserver,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the library
    init()?;

    let engine = Arc::new(ConversionEngine::new());
    let config = ConvertConfig::new(ImageFormat::WebP).quality(85);

    // Collect input files (you would typically scan a directory with
    // fastconvert::discover_files)
    let files = vec![
        PathBuf::from("photo1.jpg"),
        PathBuf::from("photo2.jpg"),
        PathBuf::from("photo3.jpg"),
    ];

    println!("Converting {} files in parallel...", files.len());

    let bar = Arc::new(ProgressBarObserver::new(files.len()));

    let op = move |input: PathBuf| {
        let engine = Arc::clone(&engine);
        let config = config.clone();
        async move {
            let output = PathBuf::from("output").join(
                input
                    .with_extension(config.format.extension())
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| input.clone()),
            );
            engine.convert_file(&input, &output, &config).await
        }
    };

    // Run all files through a 4-slot pool; one corrupt file will not
    // abort the others
    let result = run_batch(
        files,
        op,
        BatchConfig::new().concurrency(4).observer(bar.clone()),
    )
    .await;
    bar.finish();

    println!(
        "{}/{} converted in {:.2}s",
        result.successful,
        result.total,
        result.elapsed.as_secs_f64()
    );
    for record in &result.errors {
        eprintln!("failed: {} ({})", record.item.display(), record.error);
    }

    Ok(())
}
