use crate::shared::detection::{BoundingBox, Detection};

/// Rescales decoded boxes from model-input space (`[0, S)`) to display
/// space. Stateless beyond the input side length; the identity transform
/// when the display matches the model input.
pub struct CoordinateMapper {
    input_size: u32,
}

impl CoordinateMapper {
    pub fn new(input_size: u32) -> Self {
        Self { input_size }
    }

    pub fn to_display(&self, det: &Detection, display_w: u32, display_h: u32) -> Detection {
        let scale_x = display_w as f32 / self.input_size as f32;
        let scale_y = display_h as f32 / self.input_size as f32;
        Detection {
            bbox: BoundingBox {
                x: det.bbox.x * scale_x,
                y: det.bbox.y * scale_y,
                width: det.bbox.width * scale_x,
                height: det.bbox.height * scale_y,
            },
            ..det.clone()
        }
    }
}
