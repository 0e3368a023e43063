use std::time::{Duration, Instant};

/// Default throughput reporting window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1000);

/// Sliding ~1-second reporting window over completed cycles.
///
/// Not an instantaneous rate: cycles are counted and converted to
/// `round(count * 1000 / elapsed_ms)` once the window has elapsed, then
/// both the count and the timer reset. The window length is injectable
/// so tests don't have to sleep for a second.
pub struct ThroughputWindow {
    window: Duration,
    count: u32,
    started: Instant,
}

impl ThroughputWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            count: 0,
            started: Instant::now(),
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.started = Instant::now();
    }

    pub fn record_cycle(&mut self) {
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns the fps figure once per elapsed window, resetting the
    /// counter and timer; `None` while the window is still open.
    pub fn poll(&mut self) -> Option<u32> {
        let elapsed = self.started.elapsed();
        if elapsed < self.window {
            return None;
        }
        let elapsed_ms = elapsed.as_millis().max(1) as f64;
        let fps = (self.count as f64 * 1000.0 / elapsed_ms).round() as u32;
        self.reset();
        Some(fps)
    }
}

impl Default for ThroughputWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
