/// Paces the detection loop.
///
/// The loop controller calls [`wait_for_tick`](Self::wait_for_tick) after
/// each cycle and blocks until the next one is due. Implementations own
/// the timing policy: fixed-rate sleeping for a CLI, vsync for a GUI,
/// or an immediate return in tests.
pub trait RefreshScheduler: Send {
    fn wait_for_tick(&mut self);
}

/// Scheduler that never waits. Runs the loop as fast as the pipeline
/// allows; also what tests use to drive the loop deterministically.
pub struct ImmediateScheduler;

impl RefreshScheduler for ImmediateScheduler {
    fn wait_for_tick(&mut self) {}
}
