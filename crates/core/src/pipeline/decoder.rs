use thiserror::Error;

use crate::shared::detection::{BoundingBox, Detection};
use crate::shared::model_config::ModelConfig;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("raw output has {actual} elements, expected {expected} for [1, 4+{classes}, {candidates}]")]
    MalformedOutput {
        expected: usize,
        actual: usize,
        candidates: usize,
        classes: usize,
    },
}

/// Decodes the model's flat `[1, 4+C, N]` output into detections.
///
/// The buffer is column-major over candidates: feature `f` of candidate
/// `i` lives at `i + f*N`. Features 0..4 are the center-form box in
/// model-input pixels; features 4.. are per-class scores. A candidate
/// survives only when its best class score strictly exceeds the
/// confidence threshold; ties between classes resolve to the lowest
/// class index. Output preserves candidate order and is never longer
/// than `N`.
pub struct Decoder {
    config: ModelConfig,
    confidence: f32,
}

impl Decoder {
    pub fn new(config: ModelConfig, confidence: f32) -> Self {
        Self { config, confidence }
    }

    pub fn decode(&self, raw: &[f32]) -> Result<Vec<Detection>, DecodeError> {
        let n = self.config.num_candidates;
        let c = self.config.num_classes;
        let expected = self.config.raw_output_len();
        if raw.len() != expected {
            return Err(DecodeError::MalformedOutput {
                expected,
                actual: raw.len(),
                candidates: n,
                classes: c,
            });
        }

        let mut detections = Vec::new();
        for i in 0..n {
            let mut class_id = 0;
            let mut max_score = raw[i + 4 * n];
            for j in 1..c {
                let score = raw[i + (4 + j) * n];
                if score > max_score {
                    max_score = score;
                    class_id = j;
                }
            }
            if max_score <= self.confidence {
                continue;
            }

            let cx = raw[i];
            let cy = raw[i + n];
            let w = raw[i + 2 * n];
            let h = raw[i + 3 * n];
            detections.push(Detection {
                bbox: BoundingBox::from_center(cx, cy, w, h),
                class_id,
                confidence: max_score,
                class_name: self.config.class_name(class_id),
            });
        }
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config(n: usize, c: usize) -> ModelConfig {
        ModelConfig::new(
            640,
            n,
            c,
            vec!["person".to_string(), "car".to_string()],
        )
        .unwrap()
    }

    /// Build a `[1, 4+C, N]` buffer from per-candidate rows of
    /// `(cx, cy, w, h, scores...)`.
    fn raw_output(n: usize, c: usize, rows: &[(f32, f32, f32, f32, Vec<f32>)]) -> Vec<f32> {
        assert_eq!(rows.len(), n);
        let mut raw = vec![0.0f32; (4 + c) * n];
        for (i, (cx, cy, w, h, scores)) in rows.iter().enumerate() {
            raw[i] = *cx;
            raw[i + n] = *cy;
            raw[i + 2 * n] = *w;
            raw[i + 3 * n] = *h;
            for (j, score) in scores.iter().enumerate() {
                raw[i + (4 + j) * n] = *score;
            }
        }
        raw
    }

    #[test]
    fn test_single_confident_candidate() {
        // Candidate 0 at (100,100) 40x60 scoring (0.8, 0.1); the rest
        // below threshold.
        let rows = vec![
            (100.0, 100.0, 40.0, 60.0, vec![0.8, 0.1]),
            (0.0, 0.0, 0.0, 0.0, vec![0.2, 0.1]),
            (0.0, 0.0, 0.0, 0.0, vec![0.0, 0.3]),
            (0.0, 0.0, 0.0, 0.0, vec![0.1, 0.1]),
        ];
        let raw = raw_output(4, 2, &rows);
        let dets = Decoder::new(config(4, 2), 0.5).decode(&raw).unwrap();

        assert_eq!(dets.len(), 1);
        let det = &dets[0];
        assert_relative_eq!(det.bbox.x, 80.0);
        assert_relative_eq!(det.bbox.y, 70.0);
        assert_relative_eq!(det.bbox.width, 40.0);
        assert_relative_eq!(det.bbox.height, 60.0);
        assert_eq!(det.class_id, 0);
        assert_relative_eq!(det.confidence, 0.8);
        assert_eq!(det.class_name, "person");
    }

    #[test]
    fn test_tie_resolves_to_lowest_class_index() {
        let rows = vec![(50.0, 50.0, 10.0, 10.0, vec![0.6, 0.6])];
        let raw = raw_output(1, 2, &rows);
        let dets = Decoder::new(config(1, 2), 0.5).decode(&raw).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 0);
    }

    #[test]
    fn test_score_exactly_at_threshold_is_discarded() {
        let rows = vec![(50.0, 50.0, 10.0, 10.0, vec![0.5, 0.2])];
        let raw = raw_output(1, 2, &rows);
        let dets = Decoder::new(config(1, 2), 0.5).decode(&raw).unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn test_every_confidence_strictly_exceeds_threshold() {
        let rows = vec![
            (10.0, 10.0, 4.0, 4.0, vec![0.51, 0.1]),
            (20.0, 20.0, 4.0, 4.0, vec![0.5, 0.49]),
            (30.0, 30.0, 4.0, 4.0, vec![0.1, 0.9]),
        ];
        let raw = raw_output(3, 2, &rows);
        let dets = Decoder::new(config(3, 2), 0.5).decode(&raw).unwrap();
        assert_eq!(dets.len(), 2);
        assert!(dets.iter().all(|d| d.confidence > 0.5));
    }

    #[test]
    fn test_order_preserved_not_sorted_by_confidence() {
        let rows = vec![
            (10.0, 10.0, 4.0, 4.0, vec![0.6, 0.0]),
            (20.0, 20.0, 4.0, 4.0, vec![0.9, 0.0]),
            (30.0, 30.0, 4.0, 4.0, vec![0.7, 0.0]),
        ];
        let raw = raw_output(3, 2, &rows);
        let dets = Decoder::new(config(3, 2), 0.5).decode(&raw).unwrap();
        let confidences: Vec<f32> = dets.iter().map(|d| d.confidence).collect();
        assert_eq!(confidences, vec![0.6, 0.9, 0.7]);
    }

    #[test]
    fn test_argmax_picks_highest_class() {
        let rows = vec![(10.0, 10.0, 4.0, 4.0, vec![0.2, 0.8])];
        let raw = raw_output(1, 2, &rows);
        let dets = Decoder::new(config(1, 2), 0.5).decode(&raw).unwrap();
        assert_eq!(dets[0].class_id, 1);
        assert_eq!(dets[0].class_name, "car");
    }

    #[test]
    fn test_class_name_fallback_for_short_table() {
        let cfg = ModelConfig::new(640, 1, 3, vec!["person".to_string()]).unwrap();
        let rows = vec![(10.0, 10.0, 4.0, 4.0, vec![0.0, 0.0, 0.9])];
        let raw = raw_output(1, 3, &rows);
        let dets = Decoder::new(cfg, 0.5).decode(&raw).unwrap();
        assert_eq!(dets[0].class_name, "Class 2");
    }

    #[test]
    fn test_output_never_exceeds_candidate_count() {
        let rows: Vec<_> = (0..5)
            .map(|i| (i as f32, i as f32, 2.0, 2.0, vec![0.9, 0.1]))
            .collect();
        let raw = raw_output(5, 2, &rows);
        let dets = Decoder::new(config(5, 2), 0.5).decode(&raw).unwrap();
        assert_eq!(dets.len(), 5);
    }

    #[test]
    fn test_one_element_short_is_malformed() {
        let raw = vec![0.0f32; (4 + 2) * 4 - 1];
        let err = Decoder::new(config(4, 2), 0.5).decode(&raw).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedOutput {
                expected: 24,
                actual: 23,
                candidates: 4,
                classes: 2,
            }
        );
    }

    #[test]
    fn test_oversized_buffer_is_malformed() {
        // Longer than expected means N/C don't match the model
        let raw = vec![0.0f32; (4 + 2) * 4 + 6];
        assert!(Decoder::new(config(4, 2), 0.5).decode(&raw).is_err());
    }

    #[test]
    fn test_empty_buffer_is_malformed() {
        assert!(Decoder::new(config(4, 2), 0.5).decode(&[]).is_err());
    }
}
