//! Real-time object detection with an overlay renderer.
//!
//! The crate is organized by bounded context: `capture` supplies frames,
//! `detection` runs the ONNX model, `overlay` draws boxes and labels, and
//! `pipeline` wires the stages into a cancellable per-frame loop. Each
//! context keeps its trait seams in a `domain` module and concrete
//! adapters in `infrastructure`, so hosts can swap sources, backends, and
//! surfaces without touching the loop.

pub mod capture;
pub mod detection;
pub mod overlay;
pub mod pipeline;
pub mod shared;
