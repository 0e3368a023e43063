use crate::shared::detection::Detection;

/// Greedy per-class non-maximum suppression.
///
/// An opt-in cleanup stage after decoding: the reference pipeline runs
/// without it, so it is never applied unless explicitly requested.
/// Boxes are visited in descending confidence; a box is suppressed when
/// an already-kept box of the *same class* overlaps it beyond
/// `iou_threshold`. Boxes of different classes never suppress each other.
pub fn suppress(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    if detections.len() <= 1 {
        return detections;
    }

    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let dominated = kept
            .iter()
            .any(|k| k.class_id == det.class_id && k.bbox.iou(&det.bbox) > iou_threshold);
        if !dominated {
            kept.push(det);
        }
    }
    kept
}
