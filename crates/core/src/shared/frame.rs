use ndarray::ArrayView3;

/// One raw video frame: contiguous interleaved pixel bytes in row-major
/// order, RGB or RGBA.
///
/// Frames are produced by a capture source and read exactly once per
/// detection cycle; the pipeline never keeps a reference past the cycle.
/// A 4th (alpha) channel, when present, is carried but ignored by the
/// preprocessor.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert!(
            channels == 3 || channels == 4,
            "frames must be RGB or RGBA"
        );
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Position of this frame within its source sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    /// `[H, W, C]` view over the pixel bytes.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// `(r, g, b)` of the pixel at `(x, y)`. Alpha, if any, is skipped.
    pub fn rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let offset =
            ((y as usize) * (self.width as usize) + x as usize) * (self.channels as usize);
        (
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 16]; // 2x2 RGBA
        let frame = Frame::new(data.clone(), 2, 2, 4, 7);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 4);
        assert_eq!(frame.index(), 7);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_rgb_accessor_skips_alpha() {
        // 2x1 RGBA: second pixel is (10, 20, 30) with alpha 99
        let data = vec![0, 0, 0, 255, 10, 20, 30, 99];
        let frame = Frame::new(data, 2, 1, 4, 0);
        assert_eq!(frame.rgb(1, 0), (10, 20, 30));
    }

    #[test]
    fn test_rgb_accessor_three_channel() {
        let data = vec![1, 2, 3, 4, 5, 6]; // 2x1 RGB
        let frame = Frame::new(data, 2, 1, 3, 0);
        assert_eq!(frame.rgb(0, 0), (1, 2, 3));
        assert_eq!(frame.rgb(1, 0), (4, 5, 6));
    }

    #[test]
    fn test_as_ndarray_shape() {
        let data = vec![0u8; 32]; // 2x4 RGBA
        let frame = Frame::new(data, 4, 2, 4, 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 4]);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10];
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    #[should_panic(expected = "frames must be RGB or RGBA")]
    fn test_unsupported_channel_count_panics_in_debug() {
        Frame::new(vec![0u8; 4], 2, 2, 1, 0);
    }
}
