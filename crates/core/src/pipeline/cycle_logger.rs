use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting observer for detection-loop events.
///
/// Decouples the loop controller from any particular output mechanism
/// (stdout, GUI, log crate) so hosts can watch throughput and failures
/// without changing the orchestration code.
pub trait CycleLogger: Send {
    /// Throughput report at the end of each measurement window.
    fn fps(&mut self, fps: u32);

    /// How long a named cycle stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A cycle-level failure that was contained (the loop continues).
    fn cycle_error(&mut self, message: &str);

    /// Human-readable status message.
    fn info(&mut self, message: &str);

    /// End-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger for hosts with their own telemetry, and for tests.
pub struct NullCycleLogger;

impl CycleLogger for NullCycleLogger {
    fn fps(&mut self, _fps: u32) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn cycle_error(&mut self, _message: &str) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger: reports fps as it arrives, accumulates per-stage
/// timings, and prints a summary when the session ends.
pub struct StdoutCycleLogger {
    timings: HashMap<String, Vec<f64>>,
    fps_reports: Vec<u32>,
    errors: usize,
    start_time: Instant,
}

impl StdoutCycleLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            fps_reports: Vec::new(),
            errors: 0,
            start_time: Instant::now(),
        }
    }

    /// Formatted summary, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.fps_reports.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!("Session summary ({elapsed_s:.1}s):")];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let avg = durations.iter().sum::<f64>() / durations.len().max(1) as f64;
            lines.push(format!("  {stage:10}: avg {avg:6.2}ms over {} cycles", durations.len()));
        }

        if !self.fps_reports.is_empty() {
            let avg =
                self.fps_reports.iter().sum::<u32>() as f64 / self.fps_reports.len() as f64;
            lines.push(format!("  throughput: avg {avg:.1} fps"));
        }
        if self.errors > 0 {
            lines.push(format!("  contained cycle errors: {}", self.errors));
        }
        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn fps_reports(&self) -> &[u32] {
        &self.fps_reports
    }
}

impl Default for StdoutCycleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleLogger for StdoutCycleLogger {
    fn fps(&mut self, fps: u32) {
        self.fps_reports.push(fps);
        log::info!("{fps} fps");
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn cycle_error(&mut self, message: &str) {
        self.errors += 1;
        log::warn!("cycle error: {message}");
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
