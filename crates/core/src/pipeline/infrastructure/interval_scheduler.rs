use std::time::{Duration, Instant};

use crate::pipeline::refresh_scheduler::RefreshScheduler;

/// Fixed-rate scheduler: spaces ticks `1/fps` apart by wall clock.
///
/// Deadlines advance from the previous deadline, not from wake-up time,
/// so a slow cycle eats into the following sleep instead of shifting
/// the whole schedule. When the pipeline falls more than one interval
/// behind, the deadline snaps to now rather than accumulating debt.
pub struct IntervalScheduler {
    interval: Duration,
    next_deadline: Instant,
}

impl IntervalScheduler {
    pub fn new(target_fps: u32) -> Self {
        let fps = target_fps.max(1);
        let interval = Duration::from_secs_f64(1.0 / fps as f64);
        Self {
            interval,
            next_deadline: Instant::now() + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl RefreshScheduler for IntervalScheduler {
    fn wait_for_tick(&mut self) {
        let now = Instant::now();
        if self.next_deadline > now {
            std::thread::sleep(self.next_deadline - now);
            self.next_deadline += self.interval;
        } else {
            self.next_deadline = Instant::now() + self.interval;
        }
    }
}
