use ndarray::Array4;

use crate::shared::frame::Frame;

/// Converts one frame into the model's `[1, 3, S, S]` float tensor.
///
/// Nearest-neighbor stretch to `S×S` (no letterboxing — the model was
/// trained on plain resizes), then each channel mapped from `[0, 255]`
/// to `[0, 1]`. The tensor is standard row-major, so the flat layout is
/// channel-major: the full R plane, then G, then B. Any alpha channel in
/// the frame is simply never read.
pub struct Preprocessor {
    input_size: u32,
}

impl Preprocessor {
    pub fn new(input_size: u32) -> Self {
        Self { input_size }
    }

    pub fn tensor(&self, frame: &Frame) -> Array4<f32> {
        let s = self.input_size as usize;
        let src_w = frame.width() as usize;
        let src_h = frame.height() as usize;

        let mut tensor = Array4::<f32>::zeros((1, 3, s, s));
        // An empty frame has no pixels to sample; all-black is the only
        // sensible tensor for it.
        if src_w == 0 || src_h == 0 {
            return tensor;
        }
        let src = frame.as_ndarray();
        for y in 0..s {
            let src_y = (y * src_h / s).min(src_h - 1);
            for x in 0..s {
                let src_x = (x * src_w / s).min(src_w - 1);
                for c in 0..3 {
                    tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
                }
            }
        }
        tensor
    }
}
