use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;

use framesight_core::capture::domain::frame_source::CaptureProvider;
use framesight_core::capture::infrastructure::image_sequence_source::{
    ImageSequenceProvider, ImageSequenceSource,
};
use framesight_core::detection::domain::inference_backend::InferenceBackend;
use framesight_core::detection::infrastructure::model_resolver;
use framesight_core::detection::infrastructure::onnx_backend::OnnxBackend;
use framesight_core::overlay::infrastructure::image_surface::ImageSurface;
use framesight_core::pipeline::cycle_logger::StdoutCycleLogger;
use framesight_core::pipeline::infrastructure::interval_scheduler::IntervalScheduler;
use framesight_core::pipeline::loop_controller::{CycleObserver, DetectorSession};
use framesight_core::shared::model_config::{ModelConfig, DEFAULT_CONFIDENCE, DEFAULT_INPUT_SIZE};

/// Real-time object detection with overlay rendering over image sequences.
#[derive(Parser)]
#[command(name = "framesight")]
struct Cli {
    /// Directory of image frames, played in file-name order.
    input: PathBuf,

    /// Path to an ONNX detection model.
    #[arg(long)]
    model: Option<PathBuf>,

    /// URL of an ONNX detection model (cached after first download).
    #[arg(long)]
    model_url: Option<String>,

    /// File with one class name per line.
    #[arg(long)]
    classes: Option<PathBuf>,

    /// Model class count (defaults to the number of names in --classes).
    #[arg(long)]
    num_classes: Option<usize>,

    /// Model input side length S (input tensor is [1, 3, S, S]).
    #[arg(long, default_value_t = DEFAULT_INPUT_SIZE)]
    input_size: u32,

    /// Candidates N the model emits per frame.
    #[arg(long, default_value = "8400")]
    candidates: usize,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f32,

    /// Target frames per second.
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Loop the sequence instead of stopping at the last frame.
    #[arg(long = "loop")]
    loop_playback: bool,

    /// Apply per-class non-maximum suppression with this IoU threshold.
    #[arg(long)]
    nms: Option<f32>,

    /// TTF/OTF font for label text.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Write annotated frames as PNGs into this directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Stop after this many seconds.
    #[arg(long)]
    duration: Option<f64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let model_path = resolve_model(&cli)?;
    let class_names = load_class_names(cli.classes.as_deref())?;
    let num_classes = match cli.num_classes {
        Some(n) => n,
        None => class_names.len(),
    };
    if num_classes == 0 {
        return Err("Class count must be positive; is the --classes file empty?".into());
    }
    let config = ModelConfig::new(cli.input_size, cli.candidates, num_classes, class_names)?;

    let (display_w, display_h) = probe_display(&cli.input)?;
    log::info!("display size {display_w}x{display_h}");

    let mut surface = ImageSurface::new(display_w, display_h);
    if let Some(font_path) = &cli.font {
        surface = surface.with_font(load_font(font_path)?);
    }
    let shared = Arc::new(Mutex::new(surface));

    let provider: Box<dyn CaptureProvider> = Box::new(ImageSequenceProvider::new(
        cli.input.clone(),
        cli.loop_playback,
    ));

    let mut session = DetectorSession::new(
        config,
        cli.confidence,
        Box::new(Arc::clone(&shared)),
        provider,
    )
    .with_logger(Box::new(StdoutCycleLogger::new()));
    if let Some(iou) = cli.nms {
        session = session.with_nms(iou);
    }
    if let Some(out_dir) = &cli.out_dir {
        fs::create_dir_all(out_dir)?;
        session = session.with_cycle_observer(export_observer(Arc::clone(&shared), out_dir.clone()));
    }

    let input_size = cli.input_size;
    session.load_model(move || {
        let backend = OnnxBackend::load(&model_path, input_size)?;
        Ok(Box::new(backend) as Box<dyn InferenceBackend>)
    })?;

    if let Some(seconds) = cli.duration {
        let handle = session.stop_handle();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs_f64(seconds));
            handle.stop();
        });
    }

    session.start()?;
    let mut scheduler = IntervalScheduler::new(cli.fps);
    session.run(&mut scheduler)?;
    Ok(())
}

/// Observer that composites the overlay over each frame and writes it as
/// `frame_NNNNN.png` under `out_dir`. Export failures are logged, not fatal.
fn export_observer(shared: Arc<Mutex<ImageSurface>>, out_dir: PathBuf) -> CycleObserver {
    Box::new(move |frame, _detections| {
        let annotated = shared
            .lock()
            .expect("surface lock poisoned")
            .composite_over(frame);
        let path = out_dir.join(format!("frame_{:05}.png", frame.index()));
        if let Err(e) = annotated.save(&path) {
            log::warn!("could not write {}: {e}", path.display());
        }
    })
}

fn resolve_model(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.model {
        return Ok(path.clone());
    }
    let url = cli.model_url.as_ref().expect("validate() requires a model source");
    let name = url
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("model.onnx");
    log::info!("Resolving model: {name}");
    let path = model_resolver::resolve(name, url, Some(Box::new(download_progress)))?;
    eprintln!();
    Ok(path)
}

fn load_class_names(path: Option<&Path>) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read class file {}: {e}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn load_font(path: &Path) -> Result<ab_glyph::FontArc, Box<dyn std::error::Error>> {
    let bytes =
        fs::read(path).map_err(|e| format!("cannot read font {}: {e}", path.display()))?;
    ab_glyph::FontArc::try_from_vec(bytes)
        .map_err(|e| format!("cannot parse font {}: {e}", path.display()).into())
}

/// The overlay is sized to the frames, so peek at the first one.
fn probe_display(input: &Path) -> Result<(u32, u32), Box<dyn std::error::Error>> {
    use framesight_core::capture::domain::frame_source::FrameSource;

    let mut source = ImageSequenceSource::open(input, false)?;
    let frame = source
        .next_frame()?
        .ok_or_else(|| format!("no readable frames in {}", input.display()))?;
    Ok((frame.width(), frame.height()))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.is_dir() {
        return Err(format!("Input is not a directory: {}", cli.input.display()).into());
    }
    match (&cli.model, &cli.model_url) {
        (None, None) => return Err("Either --model or --model-url is required".into()),
        (Some(_), Some(_)) => {
            return Err("--model and --model-url are mutually exclusive".into())
        }
        _ => {}
    }
    if let Some(path) = &cli.model {
        if !path.exists() {
            return Err(format!("Model file not found: {}", path.display()).into());
        }
    }
    if cli.classes.is_none() && cli.num_classes.is_none() {
        return Err("Either --classes or --num-classes is required".into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.candidates == 0 {
        return Err("Candidate count must be positive".into());
    }
    if cli.fps == 0 {
        return Err("Target fps must be positive".into());
    }
    if let Some(iou) = cli.nms {
        if !(0.0..=1.0).contains(&iou) {
            return Err(format!("NMS IoU threshold must be between 0.0 and 1.0, got {iou}").into());
        }
    }
    if let Some(seconds) = cli.duration {
        if seconds <= 0.0 {
            return Err(format!("Duration must be positive, got {seconds}").into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading detection model... {pct}%");
    } else {
        eprint!("\rDownloading detection model... {downloaded} bytes");
    }
}
