use crate::overlay::class_palette::ClassPalette;
use crate::overlay::domain::draw_surface::{DrawSurface, WHITE};
use crate::shared::detection::Detection;

const LABEL_HEIGHT: f32 = 16.0;
const LABEL_CHAR_WIDTH: f32 = 7.0;
const LABEL_PAD: f32 = 3.0;

/// Draws display-space detections onto a [`DrawSurface`]: an outlined box
/// per detection plus a filled label tag above it showing the class name
/// and confidence. Holds no per-frame state; the surface is cleared at the
/// start of every render so stale boxes never linger.
pub struct OverlayRenderer {
    palette: ClassPalette,
}

impl OverlayRenderer {
    pub fn new(class_count: usize) -> Self {
        Self {
            palette: ClassPalette::new(class_count),
        }
    }

    pub fn render(&self, surface: &mut dyn DrawSurface, detections: &[Detection]) {
        surface.clear();

        for det in detections {
            let color = self.palette.color(det.class_id);
            let b = &det.bbox;
            surface.stroke_rect(b.x, b.y, b.width, b.height, color);

            let label = format!("{} {:.1}%", det.class_name, det.confidence * 100.0);
            let tag_width = label.len() as f32 * LABEL_CHAR_WIDTH + 2.0 * LABEL_PAD;
            // Tag sits above the box, clamped so it stays on screen
            let tag_y = (b.y - LABEL_HEIGHT).max(0.0);
            surface.fill_rect(b.x, tag_y, tag_width, LABEL_HEIGHT, color);
            surface.fill_text(&label, b.x + LABEL_PAD, tag_y + LABEL_PAD, WHITE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::domain::draw_surface::Color;
    use crate::shared::detection::BoundingBox;

    #[derive(Debug, PartialEq)]
    enum Op {
        Clear,
        Stroke(f32, f32, f32, f32),
        Fill(f32, f32, f32, f32),
        Text(String, f32, f32),
    }

    struct RecordingSurface {
        ops: Vec<Op>,
    }

    impl RecordingSurface {
        fn new() -> Self {
            Self { ops: Vec::new() }
        }
    }

    impl DrawSurface for RecordingSurface {
        fn width(&self) -> u32 {
            640
        }
        fn height(&self) -> u32 {
            480
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, _color: Color) {
            self.ops.push(Op::Stroke(x, y, w, h));
        }
        fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, _color: Color) {
            self.ops.push(Op::Fill(x, y, w, h));
        }
        fn fill_text(&mut self, text: &str, x: f32, y: f32, _color: Color) {
            self.ops.push(Op::Text(text.to_string(), x, y));
        }
    }

    fn detection(x: f32, y: f32, name: &str, confidence: f32) -> Detection {
        Detection {
            bbox: BoundingBox {
                x,
                y,
                width: 40.0,
                height: 60.0,
            },
            class_id: 0,
            confidence,
            class_name: name.to_string(),
        }
    }

    #[test]
    fn test_clears_before_drawing() {
        let renderer = OverlayRenderer::new(2);
        let mut surface = RecordingSurface::new();
        renderer.render(&mut surface, &[detection(10.0, 30.0, "cat", 0.8)]);
        assert_eq!(surface.ops[0], Op::Clear);
    }

    #[test]
    fn test_clears_even_with_no_detections() {
        let renderer = OverlayRenderer::new(2);
        let mut surface = RecordingSurface::new();
        renderer.render(&mut surface, &[]);
        assert_eq!(surface.ops, vec![Op::Clear]);
    }

    #[test]
    fn test_draws_box_tag_and_label_per_detection() {
        let renderer = OverlayRenderer::new(2);
        let mut surface = RecordingSurface::new();
        renderer.render(
            &mut surface,
            &[
                detection(10.0, 30.0, "cat", 0.8),
                detection(100.0, 120.0, "dog", 0.6),
            ],
        );
        // clear + (stroke, fill, text) per detection
        assert_eq!(surface.ops.len(), 7);
        assert_eq!(surface.ops[1], Op::Stroke(10.0, 30.0, 40.0, 60.0));
    }

    #[test]
    fn test_label_shows_confidence_percent_one_decimal() {
        let renderer = OverlayRenderer::new(2);
        let mut surface = RecordingSurface::new();
        renderer.render(&mut surface, &[detection(10.0, 30.0, "cat", 0.875)]);
        let text = surface.ops.iter().find_map(|op| match op {
            Op::Text(t, _, _) => Some(t.clone()),
            _ => None,
        });
        assert_eq!(text.as_deref(), Some("cat 87.5%"));
    }

    #[test]
    fn test_tag_sits_above_box() {
        let renderer = OverlayRenderer::new(2);
        let mut surface = RecordingSurface::new();
        renderer.render(&mut surface, &[detection(10.0, 30.0, "cat", 0.8)]);
        let tag_y = surface.ops.iter().find_map(|op| match op {
            Op::Fill(_, y, _, _) => Some(*y),
            _ => None,
        });
        assert_eq!(tag_y, Some(30.0 - LABEL_HEIGHT));
    }

    #[test]
    fn test_tag_clamped_at_top_edge() {
        let renderer = OverlayRenderer::new(2);
        let mut surface = RecordingSurface::new();
        renderer.render(&mut surface, &[detection(10.0, 4.0, "cat", 0.8)]);
        let tag_y = surface.ops.iter().find_map(|op| match op {
            Op::Fill(_, y, _, _) => Some(*y),
            _ => None,
        });
        assert_eq!(tag_y, Some(0.0));
    }
}
