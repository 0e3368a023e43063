/// An opaque RGB color, as produced by the class palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const WHITE: Color = Color {
    r: 255,
    g: 255,
    b: 255,
};

/// Domain interface over the host's 2-D drawing primitives.
///
/// Coordinates are display-space pixels with the origin at the top-left.
/// `clear` wipes the whole overlay; the renderer calls it once per cycle
/// so boxes never accumulate across frames. Implementations clip out-of-
/// bounds geometry rather than failing.
pub trait DrawSurface: Send {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn clear(&mut self);

    /// Outlined rectangle, one pixel thick.
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);

    /// Draw `text` with its top-left corner at `(x, y)`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color);
}
