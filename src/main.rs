use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use artpaint::models::{
    parse_color_list, BlurStep, DitherStep, EqualizeStep, PipelineConfig, TraceReport, TraceStep,
};
use artpaint::rendering::{load_mask, load_png, save_png};
use artpaint::services::{FilterService, PipelineResult};
use artpaint_filters::{Manipulation, RenderMode, SelectionMask};

#[derive(Parser)]
#[command(name = "artpaint")]
#[command(about = "ArtPaint filters for PNG images: blur, color reduction, equalization, tracing")]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Preview quality: box blur instead of Gaussian, no progress reporting
    #[arg(long, global = true)]
    preview: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ImageArgs {
    /// Input PNG file
    #[arg(short, long)]
    input: PathBuf,

    /// Output PNG file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    mask: MaskArgs,
}

#[derive(Args)]
struct MaskArgs {
    /// PNG mask restricting the filter; pixels at or above --mask-threshold are selected
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Mask luminance threshold
    #[arg(long, default_value_t = 128)]
    mask_threshold: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Gaussian blur
    Blur {
        #[command(flatten)]
        io: ImageArgs,

        /// Blur radius in pixels (below 1 is a no-op)
        #[arg(short, long, default_value_t = 2.0)]
        radius: f32,

        /// Approximate with stacked box filters
        #[arg(long)]
        fast: bool,

        /// Worker threads (default: available parallelism)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Reduce colors with a fixed or generated palette
    Dither {
        #[command(flatten)]
        io: ImageArgs,

        /// nearest, floyd-steinberg, preserve-solids or n-candidate
        #[arg(short, long, default_value = "floyd-steinberg")]
        algorithm: String,

        /// Fixed palette as comma-separated hex RGB (e.g. "#000000,#FFFFFF,#FF0000")
        #[arg(short, long)]
        colors: Option<String>,

        /// Colors to generate when --colors is not given
        #[arg(short, long, default_value_t = 16)]
        palette_size: usize,

        /// Seed for palette generation and N-candidate draws
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Candidates per pixel for n-candidate
        #[arg(long, default_value_t = artpaint_filters::dither::DEFAULT_CANDIDATES)]
        candidates: usize,

        /// Gradient a pixel must exceed to be dithered by preserve-solids
        #[arg(long, default_value_t = artpaint_filters::dither::DEFAULT_EDGE_THRESHOLD)]
        edge_threshold: u32,
    },
    /// Contrast-limited adaptive histogram equalization of luminance
    Equalize {
        #[command(flatten)]
        io: ImageArgs,

        /// Tile edge in pixels (0 equalizes the whole image at once)
        #[arg(short, long, default_value_t = 64)]
        tile_size: u32,

        /// Per-bin histogram clip limit
        #[arg(long)]
        clip_limit: Option<u32>,
    },
    /// Trace selection outlines and print them as JSON
    Trace {
        /// Input PNG file
        #[arg(short, long)]
        input: PathBuf,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        mask: MaskArgs,

        /// Luminance that selects a pixel when no mask is given
        #[arg(long, default_value_t = 128)]
        threshold: u8,

        /// Skip hole boundaries
        #[arg(long)]
        no_holes: bool,

        /// Drop outlines with fewer points
        #[arg(long, default_value_t = 1)]
        min_points: usize,
    },
    /// Run a YAML pipeline of filter steps
    Run {
        /// Pipeline file
        #[arg(long)]
        config: PathBuf,

        #[command(flatten)]
        io: ImageArgs,

        /// Write outlines from trace steps to this JSON file
        #[arg(long)]
        polygons: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mode = if cli.preview {
        RenderMode::Preview
    } else {
        RenderMode::Commit
    };

    match cli.command {
        Commands::Blur {
            io,
            radius,
            fast,
            threads,
        } => {
            let step = BlurStep {
                radius,
                fast,
                threads,
            };
            run_single(&io, step.to_manipulation(), mode)
        }
        Commands::Dither {
            io,
            algorithm,
            colors,
            palette_size,
            seed,
            candidates,
            edge_threshold,
        } => {
            let step = DitherStep {
                algorithm,
                colors: colors.as_deref().map(parse_color_list).unwrap_or_default(),
                palette_size,
                seed,
                candidates,
                edge_threshold,
                ..DitherStep::default()
            };
            run_single(&io, step.to_manipulation()?, mode)
        }
        Commands::Equalize {
            io,
            tile_size,
            clip_limit,
        } => {
            let step = EqualizeStep {
                tile_size,
                clip_limit,
            };
            run_single(&io, step.to_manipulation(), mode)
        }
        Commands::Trace {
            input,
            output,
            mask,
            threshold,
            no_holes,
            min_points,
        } => {
            let step = TraceStep {
                threshold,
                include_holes: !no_holes,
                min_points,
            };
            run_trace(&input, output.as_deref(), &mask, step.to_manipulation(), mode)
        }
        Commands::Run {
            config,
            io,
            polygons,
        } => run_pipeline(&config, &io, polygons.as_deref(), mode),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "artpaint=debug,artpaint_filters=debug"
    } else {
        "artpaint=info,artpaint_filters=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

fn load_selection(
    args: &MaskArgs,
    width: u32,
    height: u32,
) -> anyhow::Result<Option<SelectionMask>> {
    args.mask
        .as_deref()
        .map(|path| {
            load_mask(path, args.mask_threshold, width, height)
                .with_context(|| format!("Failed to load mask {}", path.display()))
        })
        .transpose()
}

fn run_single(io: &ImageArgs, manipulation: Manipulation, mode: RenderMode) -> anyhow::Result<()> {
    let service = FilterService::new(mode);
    let source = load_png(&io.input)
        .with_context(|| format!("Failed to read {}", io.input.display()))?;
    let selection = load_selection(&io.mask, source.width(), source.height())?;

    let result = service.run_pipeline(source, &[manipulation], selection.as_ref())?;
    write_image(&io.output, &result)
}

fn run_trace(
    input: &Path,
    output: Option<&Path>,
    mask: &MaskArgs,
    manipulation: Manipulation,
    mode: RenderMode,
) -> anyhow::Result<()> {
    let service = FilterService::new(mode);
    let source =
        load_png(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let selection = load_selection(mask, source.width(), source.height())?;

    let (width, height) = (source.width(), source.height());
    let result = service.run_pipeline(source, &[manipulation], selection.as_ref())?;
    let polygons = result.polygons.unwrap_or_default();
    write_trace(output, &TraceReport::new(width, height, &polygons))
}

fn run_pipeline(
    config_path: &Path,
    io: &ImageArgs,
    polygons_path: Option<&Path>,
    mode: RenderMode,
) -> anyhow::Result<()> {
    let config = PipelineConfig::load(config_path)
        .with_context(|| format!("Failed to load pipeline {}", config_path.display()))?;
    let mode = if config.preview {
        RenderMode::Preview
    } else {
        mode
    };
    let steps = config.manipulations()?;

    let service = FilterService::new(mode);
    let source = load_png(&io.input)
        .with_context(|| format!("Failed to read {}", io.input.display()))?;
    let selection = load_selection(&io.mask, source.width(), source.height())?;

    let result = service.run_pipeline(source, &steps, selection.as_ref())?;
    tracing::info!(steps = steps.len(), changed = result.changed, "Pipeline finished");

    if let Some(path) = polygons_path {
        let polygons = result.polygons.as_deref().unwrap_or_default();
        let report = TraceReport::new(result.image.width(), result.image.height(), polygons);
        write_trace(Some(path), &report)?;
    }
    write_image(&io.output, &result)
}

fn write_image(path: &Path, result: &PipelineResult) -> anyhow::Result<()> {
    let bytes = result.image.encode()?;
    save_png(path, &bytes)?;
    println!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn write_trace(path: Option<&Path>, report: &TraceReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match path {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(path = %path.display(), polygons = report.polygons.len(), "Wrote outlines");
        }
        None => println!("{json}"),
    }
    Ok(())
}
