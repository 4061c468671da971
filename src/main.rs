use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use depthforest_features::AnyFeatureResponse;
use depthforest_samples::{
    ClassSelector, CollectionConfig, DataPointCollection, DepthUnits, FeatureGeometry, FrameNaming,
    ImageSize, ImageSource, InputDevice, IntensityPreprocessor, LoadReport, PngImageSource,
    ThresholdPreprocessor, TrainingMode, label_histogram,
};

#[derive(Parser)]
#[command(name = "depthforest")]
#[command(about = "Training-sample preparation for depth-labelled decision forests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducible feature draws
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for frame loading (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Where the frame pairs live and how they are turned into samples.
#[derive(Args, Debug, Clone)]
struct CollectionArgs {
    /// Directory holding `{prefix}{index}ir.png` / `{prefix}{index}depth.png` pairs
    #[arg(long)]
    dir: PathBuf,

    /// File-name prefix of every frame
    #[arg(long, default_value = "")]
    prefix: String,

    /// Index of the first frame pair
    #[arg(long, default_value_t = 0)]
    first: usize,

    /// Number of frame pairs to load
    #[arg(long)]
    count: usize,

    /// Frame width in pixels
    #[arg(long)]
    width: usize,

    /// Frame height in pixels
    #[arg(long)]
    height: usize,

    /// Side of the square feature patch (must be odd)
    #[arg(long, default_value_t = 5)]
    patch_size: usize,

    /// Sample mode: "classification" or "regression"
    #[arg(long, default_value = "classification")]
    mode: String,

    /// Depth bin kept in regression mode (all bins if not set)
    #[arg(long)]
    target_class: Option<u8>,

    /// Keep pixels whose preprocessed intensity is zero
    #[arg(long, default_value_t = false)]
    train_on_zero: bool,

    /// Discard frames dominated by the background bin
    #[arg(long, default_value_t = false)]
    skip_background: bool,

    /// Depth frames hold raw sensor units instead of millimetres
    #[arg(long, default_value_t = false)]
    raw_depth: bool,

    /// Farthest depth in millimetres that gets a non-zero label
    #[arg(long, default_value_t = 1500)]
    max_range: u16,

    /// Intensity frames come from a webcam (`cam.png`) instead of infrared (`ir.png`)
    #[arg(long, default_value_t = false)]
    webcam: bool,

    /// Feature geometry: "pixel-difference" or "hyperplane"
    #[arg(long, default_value = "pixel-difference")]
    geometry: String,

    /// Number of depth bins
    #[arg(long, default_value_t = 4)]
    bins: usize,

    /// Intensity threshold below which pixels are zeroed
    #[arg(long, default_value_t = 0)]
    threshold: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Build a training collection from frame pairs and summarize it
    Collect {
        #[command(flatten)]
        collection: CollectionArgs,
    },

    /// Build an inference collection from a single intensity frame
    Frame {
        /// Path to an 8-bit grayscale PNG
        #[arg(long)]
        image: PathBuf,

        /// Keep zero-valued pixels as samples
        #[arg(long, default_value_t = false)]
        include_zero: bool,

        /// Threshold the frame before selecting samples
        #[arg(long)]
        threshold: Option<u8>,
    },

    /// Draw random features and report their responses over a training collection
    Probe {
        #[command(flatten)]
        collection: CollectionArgs,

        /// Number of features to draw
        #[arg(long, default_value_t = 10)]
        features: usize,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct CollectOutput {
    report: LoadReport,
    samples: usize,
    low_memory: bool,
    dimension: usize,
    class_count: usize,
    label_counts: Option<Vec<usize>>,
    target_range: Option<(u16, u16)>,
}

#[derive(Serialize)]
struct FrameOutput {
    width: usize,
    height: usize,
    samples: usize,
    low_memory: bool,
}

#[derive(Serialize)]
struct ProbeOutput {
    seed: u64,
    samples: usize,
    features: Vec<FeatureSummary>,
}

#[derive(Serialize)]
struct FeatureSummary {
    feature: AnyFeatureResponse,
    evaluated: usize,
    mean_response: Option<f64>,
    min_response: Option<f64>,
    max_response: Option<f64>,
}

fn parse_mode(s: &str, target_class: Option<u8>) -> Result<TrainingMode> {
    match s {
        "classification" => Ok(TrainingMode::Classification),
        "regression" => Ok(TrainingMode::Regression {
            target: target_class.map_or(ClassSelector::All, ClassSelector::Class),
        }),
        other => anyhow::bail!("unknown mode: {other} (expected classification or regression)"),
    }
}

fn parse_geometry(s: &str) -> Result<FeatureGeometry> {
    match s {
        "pixel-difference" => Ok(FeatureGeometry::PixelDifference),
        "hyperplane" => Ok(FeatureGeometry::Hyperplane),
        other => {
            anyhow::bail!("unknown geometry: {other} (expected pixel-difference or hyperplane)")
        }
    }
}

fn build_config(args: &CollectionArgs) -> Result<CollectionConfig> {
    let device = if args.webcam {
        InputDevice::Webcam
    } else {
        InputDevice::Infrared
    };
    let depth_units = if args.raw_depth {
        DepthUnits::Raw
    } else {
        DepthUnits::Millimeters {
            max_range: args.max_range,
        }
    };
    let naming = FrameNaming::new(args.dir.clone(), args.prefix.clone(), device);
    let config = CollectionConfig::new(
        naming,
        args.first,
        args.count,
        ImageSize::new(args.width, args.height),
    )?
    .with_patch_size(args.patch_size)
    .with_mode(parse_mode(&args.mode, args.target_class)?)
    .with_train_on_zero(args.train_on_zero)
    .with_closeup(!args.skip_background)
    .with_depth_units(depth_units)
    .with_geometry(parse_geometry(&args.geometry)?)
    .with_bins(args.bins)
    .with_threshold(args.threshold);
    Ok(config)
}

fn load_collection(args: &CollectionArgs) -> Result<(CollectionConfig, DataPointCollection)> {
    let config = build_config(args)?;
    let data = config
        .load(&PngImageSource)
        .with_context(|| format!("failed to build sample collection from {}", args.dir.display()))?;
    if data.report().loaded < data.report().requested {
        info!(
            requested = data.report().requested,
            loaded = data.report().loaded,
            "fewer frame pairs loaded than requested"
        );
    }
    Ok((config, data))
}

fn summarize_feature(feature: AnyFeatureResponse, data: &DataPointCollection) -> FeatureSummary {
    let responses: Vec<f64> = (0..data.count())
        .filter_map(|sample| feature.try_response(data, sample))
        .collect();
    let evaluated = responses.len();
    let mean_response = (evaluated > 0).then(|| responses.iter().sum::<f64>() / evaluated as f64);
    let min_response = responses.iter().copied().reduce(f64::min);
    let max_response = responses.iter().copied().reduce(f64::max);
    FeatureSummary {
        feature,
        evaluated,
        mean_response,
        min_response,
        max_response,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Collect { collection } => {
            let (_, data) = load_collection(&collection)?;

            let label_counts = data.labels().map(|labels| {
                let histogram = label_histogram(labels);
                histogram[..data.class_count().max(1)].to_vec()
            });
            let target_range = data.targets().and_then(|targets| {
                let min = targets.iter().copied().min()?;
                let max = targets.iter().copied().max()?;
                Some((min, max))
            });

            let output = CollectOutput {
                report: *data.report(),
                samples: data.count(),
                low_memory: data.low_memory(),
                dimension: data.dimension(),
                class_count: data.class_count(),
                label_counts,
                target_range,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Frame {
            image,
            include_zero,
            threshold,
        } => {
            let raw = PngImageSource
                .load(&image)
                .with_context(|| format!("failed to read {}", image.display()))?;
            let size = raw.size();
            let preprocessor = threshold.map(ThresholdPreprocessor::new);
            let data = DataPointCollection::from_raw_frame(
                raw,
                size,
                include_zero,
                preprocessor.as_ref().map(|p| p as &dyn IntensityPreprocessor),
            )
            .context("failed to build single-frame collection")?;

            let output = FrameOutput {
                width: size.width,
                height: size.height,
                samples: data.count(),
                low_memory: data.low_memory(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Probe {
            collection,
            features,
        } => {
            let (config, data) = load_collection(&collection)?;
            let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);

            let summaries: Vec<FeatureSummary> = (0..features)
                .map(|_| {
                    AnyFeatureResponse::create_random(config.geometry(), &mut rng, data.dimension())
                })
                .map(|feature| summarize_feature(feature, &data))
                .collect();
            info!(n_features = summaries.len(), "features evaluated");

            let output = ProbeOutput {
                seed: cli.seed,
                samples: data.count(),
                features: summaries,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
