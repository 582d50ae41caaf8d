//! FastConvert CLI - High-Performance Batch Image Converter
//!
//! A fast, memory-aware command-line tool for batch image format
//! conversion, designed for automation workflows and processing large
//! volumes of images.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing::{info, warn};

use fastconvert::{
    batch, init_with_config, recommend_concurrency, run_batch, BatchConfig, BatchReport, Config,
    ConversionEngine, ConversionResult, ConvertConfig, ImageFormat, ProgressBarObserver,
    SizingOptions, SystemParallelism, TraceObserver,
};
use fastconvert::batch::ParallelismProvider;

/// FastConvert - High-Performance Batch Image Converter
#[derive(Parser)]
#[command(
    name = "fastconvert",
    version,
    about = "Fast batch image converter for automation workflows",
    long_about = "FastConvert is a high-performance command-line tool for batch image format \
                  conversion. Built in Rust for speed and reliability, it converts whole \
                  directory trees with bounded parallelism and per-file failure isolation.",
    arg_required_else_help = false
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input file or directory
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Target output format
    #[arg(short, long, value_enum, value_name = "FORMAT")]
    format: Option<CliImageFormat>,

    /// Output quality (1-100)
    #[arg(short, long, default_value = "90", value_name = "QUALITY")]
    quality: u8,

    /// Number of concurrent conversions (default: auto-detect)
    #[arg(short, long, value_name = "COUNT")]
    jobs: Option<usize>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Conversion profile name
    #[arg(short, long, value_name = "NAME")]
    profile: Option<String>,

    /// Process directories recursively
    #[arg(short = 'R', long)]
    recursive: bool,

    /// Show what would be processed without actually processing
    #[arg(long)]
    dry_run: bool,

    /// Output the final report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// List available conversion profiles
    Profiles {
        /// Show detailed profile information
        #[arg(long)]
        detailed: bool,
    },
    /// Validate configuration file
    Config {
        /// Configuration file to validate
        file: PathBuf,
    },
    /// Generate example configuration file
    ExampleConfig {
        /// Output file path
        #[arg(short, long, default_value = "fastconvert.toml")]
        output: PathBuf,
        /// Use YAML format instead of TOML
        #[arg(long)]
        yaml: bool,
    },
    /// Show system information and capabilities
    Info,
}

/// CLI-compatible image format enum
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
    Tiff,
    Bmp,
}

impl From<CliImageFormat> for ImageFormat {
    fn from(format: CliImageFormat) -> Self {
        match format {
            CliImageFormat::Jpeg => ImageFormat::Jpeg,
            CliImageFormat::Png => ImageFormat::Png,
            CliImageFormat::Webp => ImageFormat::WebP,
            CliImageFormat::Gif => ImageFormat::Gif,
            CliImageFormat::Tiff => ImageFormat::Tiff,
            CliImageFormat::Bmp => ImageFormat::Bmp,
        }
    }
}

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();

    // Handle subcommands first; they need no input/output validation
    if let Some(command) = cli.command.take() {
        if let Err(e) = handle_subcommand(command).await {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
        return;
    }

    // Load configuration if provided
    let mut config = match &cli.config {
        Some(config_path) => match Config::from_file(config_path) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", config_path);
                config
            }
            Err(e) => {
                eprintln!("{}: {}", style("Error").red().bold(), e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    // CLI verbosity flags override the config file
    if cli.verbose {
        config.logging.level = "debug".to_string();
    } else if cli.quiet {
        config.logging.level = "error".to_string();
    }

    if let Err(e) = init_with_config(&config) {
        eprintln!(
            "{}: Failed to initialize FastConvert: {}",
            style("Error").red().bold(),
            e
        );
        process::exit(1);
    }

    let (input_path, output_path) = match (&cli.input, &cli.output) {
        (Some(input), Some(output)) => (input.clone(), output.clone()),
        _ => {
            eprintln!(
                "{}: Input and output paths are required",
                style("Error").red().bold()
            );
            eprintln!("Run with --help for usage information");
            process::exit(1);
        }
    };

    let convert_config = match create_convert_config(&cli, &config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
    };

    match run_conversion(&cli, &config, &input_path, &output_path, convert_config).await {
        Ok(report) => {
            if cli.json {
                match report.to_json() {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("{}: {}", style("Error").red().bold(), e);
                        process::exit(1);
                    }
                }
            } else if !cli.quiet {
                println!();
                print!("{}", report.render());
            }

            // Per-file failures are warnings; only a fully failed batch is fatal
            if report.successful == 0 && report.failed > 0 {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
    }
}

/// Handle subcommands
async fn handle_subcommand(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Profiles { detailed } => {
            show_profiles(detailed);
        }
        Commands::Config { file } => {
            validate_config_file(&file)?;
        }
        Commands::ExampleConfig { output, yaml } => {
            generate_example_config(&output, yaml)?;
        }
        Commands::Info => {
            show_system_info();
        }
    }
    Ok(())
}

/// Create conversion settings from CLI arguments, profile, and config file
fn create_convert_config(cli: &Cli, config: &Config) -> anyhow::Result<ConvertConfig> {
    let convert_config = if let Some(profile_name) = &cli.profile {
        let profile = config
            .get_profile(profile_name)
            .with_context(|| format!("unknown profile '{}'", profile_name))?;
        ConvertConfig::new(profile.format).quality(profile.quality)
    } else if let Some(format) = cli.format {
        ConvertConfig::new(format.into()).quality(cli.quality)
    } else {
        anyhow::bail!("Must specify a target format (--format) or a profile (--profile)");
    };

    convert_config.validate().context("invalid parameters")?;
    Ok(convert_config)
}

/// Run batch conversion over the discovered files
async fn run_conversion(
    cli: &Cli,
    config: &Config,
    input_path: &Path,
    output_path: &Path,
    convert_config: ConvertConfig,
) -> anyhow::Result<BatchReport> {
    info!("Starting batch conversion");
    info!("Input: {:?}", input_path);
    info!("Output: {:?}", output_path);
    info!("Target: {:?} (quality {})", convert_config.format, convert_config.quality);

    let recursive = cli.recursive || config.processing.recursive;
    let files = fastconvert::discover_files(input_path, recursive)
        .context("file discovery failed")?;

    if files.is_empty() {
        anyhow::bail!("No valid image files found in input path");
    }

    info!("Found {} files to convert", files.len());

    if cli.dry_run {
        println!("{} files would be converted:", style(files.len()).bold());
        for file in &files {
            println!("  {}", file.display());
        }
        return Ok(BatchReport::from_batch(&batch::BatchResult {
            results: Vec::new(),
            errors: Vec::new(),
            total: 0,
            successful: 0,
            failed: 0,
            elapsed: Duration::ZERO,
        }));
    }

    // Resolve concurrency: explicit flag > config file > sizing heuristic
    let concurrency = cli
        .jobs
        .or(config.processing.concurrency)
        .unwrap_or_else(|| {
            let mut options = SizingOptions::new();
            if let Some(per_item) = config.processing.memory_per_item {
                options = options.memory_per_item(per_item);
            }
            recommend_concurrency(files.len(), &options)
        });

    let engine = Arc::new(ConversionEngine::with_max_file_size(
        config.processing.max_file_size,
    ));
    let input_root = input_path.to_path_buf();
    let output_root = output_path.to_path_buf();
    let op_config = convert_config.clone();
    let timeout = config.processing.timeout_seconds;

    let op = move |file: PathBuf| {
        let engine = Arc::clone(&engine);
        let op_config = op_config.clone();
        let output = map_output_path(&file, &input_root, &output_root, op_config.format);
        async move { engine.convert_file(&file, &output, &op_config).await }
    };

    let mut batch_config: BatchConfig<PathBuf, ConversionResult> =
        BatchConfig::new().concurrency(concurrency).observer(Arc::new(TraceObserver));

    let progress_bar = if !cli.json && !cli.quiet {
        let bar = Arc::new(ProgressBarObserver::new(files.len()));
        batch_config = batch_config.observer(bar.clone());
        Some(bar)
    } else {
        None
    };

    // A hung decode must not hold its slot forever
    let result = if timeout > 0 {
        let wrapped = batch::with_timeout(op, Duration::from_secs(timeout));
        run_batch(files, wrapped, batch_config).await
    } else {
        run_batch(files, op, batch_config).await
    };

    if let Some(bar) = progress_bar {
        bar.finish();
    }

    for record in &result.errors {
        warn!(
            "failed to convert {} (item {} of {}): {}",
            record.item.display(),
            record.index + 1,
            record.total,
            record.error.user_message()
        );
    }

    Ok(BatchReport::from_batch(&result))
}

/// Map an input file to its output location, mirroring the directory
/// structure under the output root and swapping the extension
fn map_output_path(
    input_file: &Path,
    input_root: &Path,
    output_root: &Path,
    format: ImageFormat,
) -> PathBuf {
    let relative = input_file.strip_prefix(input_root).unwrap_or_else(|_| {
        input_file
            .file_name()
            .map(Path::new)
            .unwrap_or(input_file)
    });
    let mut output = output_root.join(relative);
    output.set_extension(format.extension());
    output
}

/// Show available profiles
fn show_profiles(detailed: bool) {
    let config = Config::default();
    let mut names: Vec<_> = config.profiles.keys().collect();
    names.sort();

    println!("{}", style("Available Conversion Profiles:").bold());
    println!();

    for name in names {
        let profile = &config.profiles[name];
        println!("{}", style(name).cyan().bold());
        if detailed {
            println!(
                "  format: {:?}, quality: {}",
                profile.format, profile.quality
            );
            println!();
        }
    }

    if !detailed {
        println!();
        println!("Use {} for detailed information", style("--detailed").dim());
    }
}

/// Validate configuration file
fn validate_config_file(file_path: &Path) -> anyhow::Result<()> {
    let config = Config::from_file(file_path)?;
    config.validate()?;

    println!(
        "{}: Configuration file is valid",
        style("Success").green().bold()
    );
    println!("Profiles: {}", config.profiles.len());

    Ok(())
}

/// Generate example configuration file
fn generate_example_config(output_path: &Path, use_yaml: bool) -> anyhow::Result<()> {
    let path = if use_yaml {
        output_path.with_extension("yaml")
    } else {
        output_path.to_path_buf()
    };

    let config = Config::default();
    config.to_file(&path)?;

    println!(
        "{}: Generated example configuration: {}",
        style("Success").green().bold(),
        path.display()
    );

    Ok(())
}

/// Show system information
fn show_system_info() {
    use sysinfo::{CpuExt, System, SystemExt};

    println!("{}", style("FastConvert System Information").bold());
    println!();

    println!("{}: {}", style("Version").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    let mut system = System::new_all();
    system.refresh_all();

    println!("{}", style("System:").bold());
    if let Some(name) = system.name() {
        println!("  OS: {}", name);
    }
    if let Some(version) = system.os_version() {
        println!("  Version: {}", version);
    }
    println!(
        "  Parallel-execution units: {}",
        SystemParallelism.available_parallelism()
    );
    if let Some(cpu) = system.cpus().first() {
        println!(
            "  CPU: {} ({:.2} GHz)",
            cpu.brand(),
            cpu.frequency() as f64 / 1000.0
        );
    }
    println!(
        "  Memory: {:.2} GB total, {:.2} GB available",
        system.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0,
        system.available_memory() as f64 / 1024.0 / 1024.0 / 1024.0
    );
    println!();

    println!("{}", style("Supported Formats:").bold());
    println!("  Input: JPEG, PNG, WebP, GIF, TIFF, BMP");
    println!("  Output: JPEG, PNG, WebP, GIF, TIFF, BMP");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_output_path_mirrors_structure() {
        let output = map_output_path(
            Path::new("/in/sub/photo.jpg"),
            Path::new("/in"),
            Path::new("/out"),
            ImageFormat::WebP,
        );
        assert_eq!(output, PathBuf::from("/out/sub/photo.webp"));
    }

    #[test]
    fn test_map_output_path_handles_foreign_inputs() {
        let output = map_output_path(
            Path::new("/elsewhere/photo.png"),
            Path::new("/in"),
            Path::new("/out"),
            ImageFormat::Jpeg,
        );
        assert_eq!(output, PathBuf::from("/out/photo.jpg"));
    }

    #[test]
    fn test_cli_format_mapping() {
        assert_eq!(ImageFormat::from(CliImageFormat::Webp), ImageFormat::WebP);
        assert_eq!(ImageFormat::from(CliImageFormat::Jpeg), ImageFormat::Jpeg);
    }
}
