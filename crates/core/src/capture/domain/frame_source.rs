use crate::shared::frame::Frame;

/// A live or offline supplier of successive raw frames.
///
/// `next_frame` returns `Ok(None)` when the source is exhausted (offline
/// sources only; a live device keeps producing until stopped). `stop`
/// releases the underlying device or file handles and is idempotent.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    fn stop(&mut self);
}

/// Acquires a `FrameSource` on demand.
///
/// Acquisition is the fallible step (device busy, permission denied), so
/// it happens at session `start()` rather than construction, and a failed
/// acquisition leaves the session able to retry.
pub trait CaptureProvider: Send {
    fn acquire(&mut self) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>>;
}
