//! fiducial-measure CLI: marker-scaled measurement of photos and frame sequences.

use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fiducial_measure::{
    annotate, annotate_frame, annotated_output_path, load_frame, measure_prepared,
    run_session, save_annotated, CaptureSession, ConfigError, FrameReport, ImageSequenceSource,
    ManualCalibration, MarkerRecording, MeasureConfig, PipelineError, SegmentMode,
    SessionSummary, StillReport,
};
use log::{info, warn, LevelFilter};
use serde::Serialize;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "fiducial-measure")]
#[command(about = "Measure objects next to a fiducial marker of known size")]
#[command(version)]
struct Cli {
    /// Log verbosity.
    #[arg(long, value_enum, global = true, default_value_t = LogLevelArg::Info)]
    log_level: LogLevelArg,

    /// Emit structured JSON logs.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure objects (or trunk cross-sections) in one still image.
    Measure(MeasureArgs),

    /// Measure objects across an ordered frame sequence with smoothing.
    Sequence(SequenceArgs),

    /// Print the default configuration as JSON.
    DefaultConfig {
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct MeasureArgs {
    /// Input image.
    image: PathBuf,

    /// Marker recording (JSON); its first frame holds this image's markers.
    #[arg(long)]
    markers: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ModeArg::Object)]
    mode: ModeArg,

    /// Pipeline configuration (JSON); missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Manual reference: pixel span of a known length, in input-image pixels.
    #[arg(long, requires = "manual_length")]
    manual_pixels: Option<f64>,

    /// Manual reference: physical length spanned by `--manual-pixels`.
    #[arg(long, requires = "manual_pixels")]
    manual_length: Option<f64>,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Annotated image path (default: prefixed file next to the input).
    #[arg(long, conflicts_with = "no_annotate")]
    annotated: Option<PathBuf>,

    /// Skip writing the annotated image.
    #[arg(long)]
    no_annotate: bool,
}

#[derive(Debug, Clone, Args)]
struct SequenceArgs {
    /// Frame images in capture order.
    #[arg(required_unless_present = "dir")]
    frames: Vec<PathBuf>,

    /// Read every image in this directory, sorted by name.
    #[arg(long, conflicts_with = "frames")]
    dir: Option<PathBuf>,

    /// Marker recording (JSON) with one entry per frame.
    #[arg(long)]
    markers: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write one annotated image per frame into this directory.
    #[arg(long)]
    annotate_dir: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Object,
    Trunk,
}

impl From<ModeArg> for SegmentMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Object => SegmentMode::Object,
            ModeArg::Trunk => SegmentMode::Trunk,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(value: LogLevelArg) -> Self {
        match value {
            LogLevelArg::Off => LevelFilter::Off,
            LogLevelArg::Error => LevelFilter::Error,
            LogLevelArg::Warn => LevelFilter::Warn,
            LogLevelArg::Info => LevelFilter::Info,
            LogLevelArg::Debug => LevelFilter::Debug,
            LogLevelArg::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Serialize)]
struct StillOutput<'a> {
    input: &'a Path,
    annotated: Option<PathBuf>,
    /// Measured-frame pixels per input pixel.
    resize_scale: f64,
    #[serde(flatten)]
    report: &'a StillReport,
}

#[derive(Serialize)]
struct SequenceOutput {
    summary: SessionSummary,
    frames: Vec<FrameReport>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Measure(args) => run_measure(&args),
        Commands::Sequence(args) => run_sequence(&args),
        Commands::DefaultConfig { out } => write_json(&MeasureConfig::default(), out.as_deref()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) {
    fiducial_measure::core::init_tracing(cli.json_logs);
    let _ = tracing_log::LogTracer::init();
    log::set_max_level(cli.log_level.into());
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) {
    if let Err(e) = fiducial_measure::core::init_with_level(cli.log_level.into()) {
        eprintln!("warning: failed to install logger: {e}");
    }
}

fn load_config(path: Option<&Path>) -> Result<MeasureConfig, ConfigError> {
    match path {
        Some(path) => MeasureConfig::from_json_file(path),
        None => Ok(MeasureConfig::default()),
    }
}

fn write_json<T: Serialize + ?Sized>(value: &T, out: Option<&Path>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            fs::write(path, json).map_err(|source| PipelineError::Report {
                path: path.to_path_buf(),
                source,
            })?;
            info!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

// ── measure ────────────────────────────────────────────────────────────

fn run_measure(args: &MeasureArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let frame = load_frame(&args.image)?;
    let detections = match &args.markers {
        Some(path) => MarkerRecording::from_json_file(path)?.frame(0).to_vec(),
        None => Vec::new(),
    };

    let manual = match (args.manual_pixels, args.manual_length) {
        (Some(pixels), Some(length)) => Some(ManualCalibration::new(pixels, length)),
        _ => None,
    };

    let (prepared, report) =
        measure_prepared(frame, &detections, manual, args.mode.into(), &config)?;
    if report.is_approximate() {
        warn!("measurements use the approximate scale and are rough estimates");
    }

    let annotated = if args.no_annotate {
        None
    } else {
        let path = args
            .annotated
            .clone()
            .unwrap_or_else(|| annotated_output_path(&args.image, &config.output_prefix));
        save_annotated(&annotate(&prepared.image, &report), &path)?;
        info!("annotated image written to {}", path.display());
        Some(path)
    };

    write_json(
        &StillOutput {
            input: &args.image,
            annotated,
            resize_scale: prepared.scale,
            report: &report,
        },
        args.report.as_deref(),
    )
}

// ── sequence ───────────────────────────────────────────────────────────

fn run_sequence(args: &SequenceArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let mut source = match &args.dir {
        Some(dir) => ImageSequenceSource::from_dir(dir)?,
        None => ImageSequenceSource::new(args.frames.iter().cloned()),
    };
    let recording = match &args.markers {
        Some(path) => MarkerRecording::from_json_file(path)?,
        None => {
            warn!("no marker recording given, every frame will await a marker");
            MarkerRecording::default()
        }
    };
    let mut detector = recording.into_detector();
    let mut session = CaptureSession::new(&config)?;
    if let Some(dir) = &args.annotate_dir {
        fs::create_dir_all(dir)?;
    }

    let mut frames = Vec::new();
    let mut export_error = None;
    let summary = run_session(&mut source, &mut detector, &mut session, |frame, report| {
        if let Some(dir) = &args.annotate_dir {
            let path = dir.join(format!("{}{:05}.png", config.output_prefix, report.index));
            if let Err(e) = save_annotated(&annotate_frame(frame, report), &path) {
                export_error = Some(e);
                return ControlFlow::Break(());
            }
        }
        frames.push(report.clone());
        if args.max_frames.is_some_and(|max| frames.len() >= max) {
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    })?;
    if let Some(e) = export_error {
        return Err(e.into());
    }

    write_json(&SequenceOutput { summary, frames }, args.report.as_deref())
}
