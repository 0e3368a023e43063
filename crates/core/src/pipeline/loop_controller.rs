use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::capture::domain::frame_source::{CaptureProvider, FrameSource};
use crate::detection::domain::inference_backend::InferenceBackend;
use crate::overlay::domain::draw_surface::DrawSurface;
use crate::overlay::renderer::OverlayRenderer;
use crate::pipeline::cycle_logger::{CycleLogger, NullCycleLogger};
use crate::pipeline::coordinate_mapper::CoordinateMapper;
use crate::pipeline::decoder::Decoder;
use crate::pipeline::nms;
use crate::pipeline::preprocessor::Preprocessor;
use crate::pipeline::refresh_scheduler::RefreshScheduler;
use crate::pipeline::throughput::ThroughputWindow;
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;
use crate::shared::model_config::ModelConfig;

/// Lifecycle of a [`DetectorSession`].
///
/// `Idle` until a model is loaded, `Ready` once it is, `Detecting` while
/// the loop runs. A failed model load returns to `Idle` and disables the
/// session; a failed capture acquisition stays in `Ready` and may retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ModelLoading,
    Ready,
    Detecting,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("session is disabled after an earlier model load failure")]
    ModelDisabled,

    #[error("could not acquire a frame source: {0}")]
    CaptureAcquisition(String),

    #[error("{operation} is not valid in the {state:?} state")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}

/// Cheap, clonable handle that requests a running session to stop.
///
/// The request is cooperative: the in-flight cycle always completes (and
/// renders) before the loop observes the flag and winds down.
#[derive(Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Callback invoked after each completed cycle with the captured frame
/// and the display-space detections that were just rendered.
pub type CycleObserver = Box<dyn FnMut(&Frame, &[Detection]) + Send>;

/// Orchestrates the per-frame detection loop.
///
/// Owns every pipeline stage and drives them in order each cycle:
/// capture, preprocess, infer, decode, map, render. Cycle-level failures
/// are contained within their cycle; only lifecycle operations return
/// errors to the caller.
pub struct DetectorSession {
    state: SessionState,
    config: ModelConfig,
    backend: Option<Box<dyn InferenceBackend>>,
    preprocessor: Preprocessor,
    decoder: Decoder,
    mapper: CoordinateMapper,
    renderer: OverlayRenderer,
    surface: Box<dyn DrawSurface>,
    provider: Box<dyn CaptureProvider>,
    source: Option<Box<dyn FrameSource>>,
    running: Arc<AtomicBool>,
    throughput: ThroughputWindow,
    logger: Box<dyn CycleLogger>,
    on_cycle: Option<CycleObserver>,
    nms_iou: Option<f32>,
    load_failed: bool,
}

impl DetectorSession {
    pub fn new(
        config: ModelConfig,
        confidence: f32,
        surface: Box<dyn DrawSurface>,
        provider: Box<dyn CaptureProvider>,
    ) -> Self {
        let input_size = config.input_size;
        let num_classes = config.num_classes;
        Self {
            state: SessionState::Idle,
            decoder: Decoder::new(config.clone(), confidence),
            config,
            backend: None,
            preprocessor: Preprocessor::new(input_size),
            mapper: CoordinateMapper::new(input_size),
            renderer: OverlayRenderer::new(num_classes),
            surface,
            provider,
            source: None,
            running: Arc::new(AtomicBool::new(false)),
            throughput: ThroughputWindow::default(),
            logger: Box::new(NullCycleLogger),
            on_cycle: None,
            nms_iou: None,
            load_failed: false,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn CycleLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Enables per-class non-maximum suppression after decoding. Off by
    /// default.
    pub fn with_nms(mut self, iou_threshold: f32) -> Self {
        self.nms_iou = Some(iou_threshold);
        self
    }

    pub fn with_throughput_window(mut self, window: Duration) -> Self {
        self.throughput = ThroughputWindow::new(window);
        self
    }

    pub fn with_cycle_observer(mut self, observer: CycleObserver) -> Self {
        self.on_cycle = Some(observer);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Loads the inference backend via `loader`, moving `Idle` through
    /// `ModelLoading` to `Ready`.
    ///
    /// A failed load returns to `Idle` and disables the session for good:
    /// a model that failed to load once will not load differently later,
    /// and surfacing that beats silently retrying.
    pub fn load_model<F>(&mut self, loader: F) -> Result<(), SessionError>
    where
        F: FnOnce() -> Result<Box<dyn InferenceBackend>, Box<dyn std::error::Error>>,
    {
        if self.load_failed {
            return Err(SessionError::ModelDisabled);
        }
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState {
                operation: "load_model",
                state: self.state,
            });
        }

        self.state = SessionState::ModelLoading;
        self.logger.info("loading detection model");
        match loader() {
            Ok(backend) => {
                self.backend = Some(backend);
                self.state = SessionState::Ready;
                self.logger.info("model ready");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Idle;
                self.load_failed = true;
                Err(SessionError::ModelLoad(e.to_string()))
            }
        }
    }

    /// Acquires a frame source and enters `Detecting`.
    ///
    /// Acquisition failure keeps the session in `Ready`; the caller may
    /// call `start` again once the device frees up.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Ready {
            return Err(SessionError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        let source = self
            .provider
            .acquire()
            .map_err(|e| SessionError::CaptureAcquisition(e.to_string()))?;
        self.source = Some(source);
        self.state = SessionState::Detecting;
        self.running.store(true, Ordering::SeqCst);
        self.throughput.reset();
        self.logger.info("detection started");
        Ok(())
    }

    /// Requests the loop to stop. Ignored outside `Detecting`.
    pub fn stop(&mut self) {
        if self.state == SessionState::Detecting {
            self.running.store(false, Ordering::SeqCst);
        }
    }

    /// Handle for stopping the session from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Runs the detection loop on the calling thread until stopped or the
    /// source is exhausted, then tears down: the source is released, the
    /// overlay wiped, and the session returns to `Ready`.
    pub fn run(&mut self, scheduler: &mut dyn RefreshScheduler) -> Result<(), SessionError> {
        if self.state != SessionState::Detecting {
            return Err(SessionError::InvalidState {
                operation: "run",
                state: self.state,
            });
        }

        while self.running.load(Ordering::SeqCst) {
            self.cycle();
            if let Some(fps) = self.throughput.poll() {
                self.logger.fps(fps);
            }
            scheduler.wait_for_tick();
        }

        if let Some(mut source) = self.source.take() {
            source.stop();
        }
        self.surface.clear();
        self.state = SessionState::Ready;
        self.logger.info("detection stopped");
        self.logger.summary();
        Ok(())
    }

    /// One capture → render pass. Never propagates: failures are logged
    /// and confined to this cycle so one bad frame can't end the session.
    fn cycle(&mut self) {
        let Some(source) = self.source.as_mut() else {
            return;
        };
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.logger.info("frame source exhausted");
                self.running.store(false, Ordering::SeqCst);
                return;
            }
            Err(e) => {
                self.logger.cycle_error(&format!("frame capture: {e}"));
                return;
            }
        };

        let Some(backend) = self.backend.as_mut() else {
            return;
        };

        let started = Instant::now();
        let tensor = self.preprocessor.tensor(&frame);
        self.logger
            .timing("preprocess", started.elapsed().as_secs_f64() * 1000.0);

        let started = Instant::now();
        let raw = match backend.infer(tensor) {
            Ok(raw) => raw,
            Err(e) => {
                self.logger.cycle_error(&format!("inference: {e}"));
                return;
            }
        };
        self.logger
            .timing("inference", started.elapsed().as_secs_f64() * 1000.0);

        let started = Instant::now();
        let detections = match self.decoder.decode(&raw) {
            Ok(detections) => detections,
            Err(e) => {
                // Malformed output renders an empty overlay so stale
                // boxes from the previous frame don't linger.
                self.logger.cycle_error(&format!("decode: {e}"));
                self.renderer.render(self.surface.as_mut(), &[]);
                self.throughput.record_cycle();
                return;
            }
        };
        let detections = match self.nms_iou {
            Some(iou) => nms::suppress(detections, iou),
            None => detections,
        };

        let (display_w, display_h) = (self.surface.width(), self.surface.height());
        let mapped: Vec<Detection> = detections
            .iter()
            .map(|d| self.mapper.to_display(d, display_w, display_h))
            .collect();
        self.renderer.render(self.surface.as_mut(), &mapped);
        self.logger
            .timing("decode+render", started.elapsed().as_secs_f64() * 1000.0);

        if let Some(observer) = self.on_cycle.as_mut() {
            observer(&frame, &mapped);
        }
        self.throughput.record_cycle();
    }
}
