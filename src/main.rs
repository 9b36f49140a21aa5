use clap::{Parser, Subcommand};
use retina_denoise::config::{self, DenoiseConfig};
use retina_denoise::dataset::{Dataset, Split};
use retina_denoise::imaging::{
    self, FilterKind, FilterParams, FilterSpec, ImageCodec, PixelBuffer, RustCodec,
};
use retina_denoise::output::{self, DatasetEntry, FilterOutcome};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retina-denoise")]
#[command(about = "Denoise and assess grayscale retinal fundus images")]
#[command(long_about = "\
Denoise and assess grayscale retinal fundus images

Five filters are available: median, adaptive, bilateral, morphological and
wiener. Colour inputs are reduced to grayscale on load. Outputs are written
in the format named by the output file's extension (png, jpg, tif, bmp).

Filter defaults come from denoise.toml when present:

  [median]         kernel_size = 5
  [adaptive]       window_size = 5
  [bilateral]      d = 9, sigma_color = 75.0, sigma_space = 75.0
  [morphological]  kernel_size = 5
  [wiener]         window_size = 5

Run 'retina-denoise gen-config' to generate a documented denoise.toml.
Set RUST_LOG=debug for per-filter diagnostics.")]
#[command(version)]
struct Cli {
    /// Filter configuration file (missing file = stock defaults)
    #[arg(long, default_value = "denoise.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Shared flag for commands with machine-readable output.
#[derive(clap::Args, Clone)]
struct JsonArgs {
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Apply one filter to an image
    Denoise {
        input: PathBuf,
        /// Filter name (median, adaptive, bilateral, morphological, wiener)
        #[arg(short, long)]
        filter: FilterKind,
        /// Filter parameter override, e.g. -p kernel_size=7 (repeatable)
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, f64)>,
        /// Output image path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run all five filters and write each result
    Compare {
        input: PathBuf,
        /// Directory for <stem>-<filter>.png outputs
        #[arg(long, default_value = "denoised")]
        out_dir: PathBuf,
        /// Score each output against the input (PSNR, SSIM)
        #[arg(long)]
        metrics: bool,
        #[command(flatten)]
        json: JsonArgs,
    },
    /// Print statistics and blur score of an image
    Analyze {
        input: PathBuf,
        #[command(flatten)]
        json: JsonArgs,
    },
    /// Compute PSNR and SSIM of a candidate against a reference
    Metrics {
        reference: PathBuf,
        candidate: PathBuf,
        #[command(flatten)]
        json: JsonArgs,
    },
    /// List the available filters and their parameters
    Filters {
        #[command(flatten)]
        json: JsonArgs,
    },
    /// List (and optionally analyze) the images of a DRIVE-style dataset
    Dataset {
        root: PathBuf,
        /// Dataset split: training or test
        #[arg(long, default_value = "training")]
        split: Split,
        /// Compute statistics for every image
        #[arg(long)]
        analyze: bool,
        #[command(flatten)]
        json: JsonArgs,
    },
    /// Print a stock denoise.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let codec = RustCodec::new();

    match cli.command {
        Command::Denoise {
            input,
            filter,
            params,
            output,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let params: FilterParams = params.into_iter().collect();
            let spec = FilterSpec::from_params_with_base(config.spec_for(filter), &params)?;

            let buffer = read_image(&codec, &input)?;
            let denoised = imaging::run(&buffer, &spec)?;
            codec.encode_file(&denoised, &output)?;
            tracing::info!("{spec} → {}", output.display());
        }
        Command::Compare {
            input,
            out_dir,
            metrics,
            json,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let buffer = read_image(&codec, &input)?;
            std::fs::create_dir_all(&out_dir)?;

            let outcomes = compare_all(&codec, &config, &buffer, &input, &out_dir, metrics)?;
            if json.json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                output::print_comparison(&outcomes);
            }
        }
        Command::Analyze { input, json } => {
            let buffer = read_image(&codec, &input)?;
            let stats = imaging::analyze(&buffer);
            if json.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                output::print_statistics(&stats);
            }
        }
        Command::Metrics {
            reference,
            candidate,
            json,
        } => {
            let reference = read_image(&codec, &reference)?;
            let candidate = read_image(&codec, &candidate)?;
            let metrics = imaging::compare(&reference, &candidate)?;
            if json.json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                output::print_metrics(&metrics);
            }
        }
        Command::Filters { json } => {
            let catalog = imaging::catalog();
            if json.json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else {
                output::print_catalog(&catalog);
            }
        }
        Command::Dataset {
            root,
            split,
            analyze,
            json,
        } => {
            let dataset = Dataset::open(root)?;
            let entries: Vec<DatasetEntry> = if analyze {
                dataset
                    .load_split(&codec, split)?
                    .into_iter()
                    .map(|(name, buffer)| DatasetEntry {
                        name,
                        statistics: Some(imaging::analyze(&buffer)),
                    })
                    .collect()
            } else {
                dataset
                    .list(split)?
                    .into_iter()
                    .map(|name| DatasetEntry {
                        name,
                        statistics: None,
                    })
                    .collect()
            };
            if json.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                output::print_dataset(split, &entries);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run every filter with configured parameters and write each success to
/// `<out_dir>/<stem>-<filter>.png`.
fn compare_all(
    codec: &RustCodec,
    config: &DenoiseConfig,
    buffer: &PixelBuffer,
    input: &Path,
    out_dir: &Path,
    with_metrics: bool,
) -> Result<Vec<FilterOutcome>, Box<dyn std::error::Error>> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    let spec_for = |kind: FilterKind| config.spec_for(kind);

    let results: Vec<_> = if with_metrics {
        imaging::evaluate_all_with(buffer, spec_for)
            .into_iter()
            .map(|(kind, r)| (kind, r.map(|e| (e.output, Some(e.metrics)))))
            .collect()
    } else {
        imaging::run_all_with(buffer, spec_for)
            .into_entries()
            .into_iter()
            .map(|(kind, r)| (kind, r.map(|output| (output, None))))
            .collect()
    };

    let mut outcomes = Vec::with_capacity(results.len());
    for (kind, result) in results {
        let outcome = match result {
            Ok((denoised, metrics)) => {
                let path = out_dir.join(format!("{stem}-{kind}.png"));
                codec.encode_file(&denoised, &path)?;
                tracing::info!("Wrote {}", path.display());
                FilterOutcome {
                    filter: kind,
                    output: Some(path),
                    metrics,
                    error: None,
                }
            }
            Err(e) => FilterOutcome {
                filter: kind,
                output: None,
                metrics: None,
                error: Some(e.to_string()),
            },
        };
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

fn read_image(codec: &RustCodec, path: &Path) -> Result<PixelBuffer, imaging::CodecError> {
    let buffer = codec.decode_file(path)?;
    tracing::info!(
        "Read {} ({}x{})",
        path.display(),
        buffer.width(),
        buffer.height()
    );
    Ok(buffer)
}

/// Parse a `name=value` filter parameter.
fn parse_param(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    Ok((name.trim().to_string(), value))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
