use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pvreel::{
    CpuBackend, CpuBackendOpts, CubeSource as _, DisplayConfig, FfmpegEncoder, FfmpegEncoderOpts,
    FitsSource, Fps, FrameIndex, FrameNaming, FrameSequencer, FrameStore, Pipeline, PipelineOpts,
    VideoCodec,
};

#[derive(Parser, Debug)]
#[command(name = "pvreel", version, about = "Position-velocity movies from spectral cubes")]
struct Cli {
    /// Log at debug level (`RUST_LOG` overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print cube shape and axis metadata.
    Info(InfoArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render every frame as a numbered PNG.
    Frames(FramesArgs),
    /// Assemble numbered PNGs into an MP4 (requires `ffmpeg` on PATH).
    Assemble(AssembleArgs),
    /// Render an MP4 straight from the cube (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input FITS cube.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Args, Debug)]
struct DisplayArgs {
    /// Display config JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference map colour scale lower bound.
    #[arg(long)]
    ref_min: Option<f32>,
    /// Reference map colour scale upper bound.
    #[arg(long)]
    ref_max: Option<f32>,
    /// Slice colour scale lower bound.
    #[arg(long)]
    slice_min: Option<f32>,
    /// Slice colour scale upper bound.
    #[arg(long)]
    slice_max: Option<f32>,

    /// Font file for titles and labels.
    #[arg(long)]
    font: Option<PathBuf>,
}

impl DisplayArgs {
    fn resolve(&self) -> anyhow::Result<DisplayConfig> {
        let mut display = match self.config.as_ref() {
            Some(path) => DisplayConfig::from_path(path)?,
            None => DisplayConfig::default(),
        };
        if let Some(v) = self.ref_min {
            display.reference.color_scale.min = v;
        }
        if let Some(v) = self.ref_max {
            display.reference.color_scale.max = v;
        }
        if let Some(v) = self.slice_min {
            display.slice.color_scale.min = v;
        }
        if let Some(v) = self.slice_max {
            display.slice.color_scale.max = v;
        }
        if let Some(font) = self.font.as_ref() {
            display.font_path = Some(font.clone());
        }
        display.validate()?;
        Ok(display)
    }
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input FITS cube.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Slice index (0-based).
    #[arg(long)]
    index: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    display: DisplayArgs,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    /// Input FITS cube.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory.
    #[arg(long)]
    dir: PathBuf,

    /// File name prefix.
    #[arg(long, default_value = "frame")]
    prefix: String,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    #[command(flatten)]
    display: DisplayArgs,
}

#[derive(Parser, Debug)]
struct AssembleArgs {
    /// Directory holding `<prefix>_<index>.png` frames.
    #[arg(long)]
    dir: PathBuf,

    /// File name prefix.
    #[arg(long, default_value = "frame")]
    prefix: String,

    /// Number of frames expected; defaults to the highest index found plus one.
    #[arg(long)]
    expected: Option<u64>,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Frame rate, `N` or `NUM/DEN`.
    #[arg(long, default_value = "10")]
    fps: Fps,

    /// `h264` or `mpeg4` (`mp4v`).
    #[arg(long, default_value = "h264")]
    codec: VideoCodec,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input FITS cube.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Frame rate, `N` or `NUM/DEN`.
    #[arg(long, default_value = "10")]
    fps: Fps,

    /// Also persist every frame as PNG in this directory.
    #[arg(long)]
    keep_frames: Option<PathBuf>,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size (parallel mode only).
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    /// `h264` or `mpeg4` (`mp4v`).
    #[arg(long, default_value = "h264")]
    codec: VideoCodec,

    #[command(flatten)]
    display: DisplayArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Assemble(args) => cmd_assemble(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_pipeline(in_path: &Path, display: DisplayConfig) -> anyhow::Result<Pipeline> {
    let pipeline = Pipeline::from_source(&FitsSource::new(in_path), display)
        .with_context(|| format!("load cube '{}'", in_path.display()))?;
    Ok(pipeline)
}

fn cpu_backend(display: &DisplayConfig) -> anyhow::Result<CpuBackend> {
    let font = display.load_font().context("load font")?;
    Ok(CpuBackend::new(CpuBackendOpts {
        font: font.map(Arc::new),
    })?)
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let (cube, coords) = FitsSource::new(&args.in_path)
        .load()
        .with_context(|| format!("load cube '{}'", args.in_path.display()))?;
    let (v, y, x) = cube.shape();
    println!("{}", args.in_path.display());
    println!("  shape (V, Y, X): ({v}, {y}, {x})");
    println!("  frames: {x}");
    for (name, axis, len) in [
        ("spectral", &coords.spectral, v),
        ("y", &coords.y, y),
        ("x", &coords.x, x),
    ] {
        let first = axis.world(0.0);
        let last = axis.world(len.saturating_sub(1) as f64);
        println!(
            "  {name:<8} {:<10} [{} .. {}] {}",
            axis.ctype,
            axis.format_world(first),
            axis.format_world(last),
            axis.display_unit()
        );
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let display = args.display.resolve()?;
    let mut backend = cpu_backend(&display)?;
    let pipeline = load_pipeline(&args.in_path, display)?;
    let frame = pipeline.render_frame(FrameIndex(args.index), &mut backend)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    // Frames are opaque, so premultiplied and straight RGBA agree.
    image::save_buffer_with_format(
        &args.out,
        &frame.image.data,
        frame.image.width,
        frame.image.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let display = args.display.resolve()?;
    let mut backend = cpu_backend(&display)?;
    let pipeline = load_pipeline(&args.in_path, display)?;

    let naming = FrameNaming::for_len(args.prefix, pipeline.frame_count())?;
    let opts = PipelineOpts {
        parallel: args.parallel,
        threads: args.threads,
        store: Some(FrameStore::new(&args.dir, naming)),
        ..PipelineOpts::default()
    };
    let written = pipeline.render_frames(&opts, &mut backend)?;

    eprintln!("wrote {written} frames to {}", args.dir.display());
    Ok(())
}

fn cmd_assemble(args: AssembleArgs) -> anyhow::Result<()> {
    let files = FrameSequencer::new(args.expected)
        .scan_dir(&args.dir, &args.prefix)
        .with_context(|| format!("scan frames in '{}'", args.dir.display()))?;

    let mut encoder = FfmpegEncoder::new(FfmpegEncoderOpts {
        codec: args.codec,
        ..FfmpegEncoderOpts::default()
    });
    let frames = files.iter().map(pvreel::load_frame_file);
    let stream = pvreel::assemble(frames, args.fps, &args.out, &mut encoder)?;

    eprintln!(
        "wrote {} ({} frames, {}x{})",
        stream.path.display(),
        stream.frame_count,
        stream.width,
        stream.height
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let display = args.display.resolve()?;
    let mut backend = cpu_backend(&display)?;
    let pipeline = load_pipeline(&args.in_path, display)?;

    let store = match args.keep_frames.as_ref() {
        Some(dir) => Some(FrameStore::new(
            dir,
            FrameNaming::for_len("frame", pipeline.frame_count())?,
        )),
        None => None,
    };
    let opts = PipelineOpts {
        fps: args.fps,
        parallel: args.parallel,
        threads: args.threads,
        chunk_size: args.chunk_size,
        store,
        ..PipelineOpts::default()
    };
    let mut encoder = FfmpegEncoder::new(FfmpegEncoderOpts {
        codec: args.codec,
        ..FfmpegEncoderOpts::default()
    });
    let report = pipeline.render_all(&opts, &args.out, &mut backend, &mut encoder)?;

    eprintln!(
        "wrote {} ({} frames, {}x{})",
        report.stream.path.display(),
        report.frames,
        report.stream.width,
        report.stream.height
    );
    Ok(())
}
