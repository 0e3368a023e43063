use std::sync::{Arc, Mutex};

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::overlay::domain::draw_surface::{Color, DrawSurface};
use crate::shared::frame::Frame;

const FONT_SIZE: f32 = 12.0;

/// Raster [`DrawSurface`]: draws into a transparent RGBA buffer sized to
/// the display, using `imageproc` primitives. Text needs a font supplied
/// at construction; without one, labels degrade to their colored tag.
///
/// The overlay can be alpha-composited over a frame to export annotated
/// images.
pub struct ImageSurface {
    overlay: RgbaImage,
    font: Option<FontArc>,
    font_scale: PxScale,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            overlay: RgbaImage::new(width, height),
            font: None,
            font_scale: PxScale::from(FONT_SIZE),
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn overlay(&self) -> &RgbaImage {
        &self.overlay
    }

    /// Alpha-blend the overlay onto `frame`, returning the annotated image.
    pub fn composite_over(&self, frame: &Frame) -> RgbaImage {
        let mut base = frame_to_rgba(frame);
        let (w, h) = (
            base.width().min(self.overlay.width()),
            base.height().min(self.overlay.height()),
        );
        for y in 0..h {
            for x in 0..w {
                let src = self.overlay.get_pixel(x, y);
                let a = src[3] as u32;
                if a == 0 {
                    continue;
                }
                let dst = base.get_pixel_mut(x, y);
                for c in 0..3 {
                    let blended = (src[c] as u32 * a + dst[c] as u32 * (255 - a)) / 255;
                    dst[c] = blended as u8;
                }
                dst[3] = 255;
            }
        }
        base
    }

    /// Clamp a float rect to the surface, dropping degenerate remainders.
    fn clip(&self, x: f32, y: f32, width: f32, height: f32) -> Option<Rect> {
        let x0 = x.max(0.0) as i32;
        let y0 = y.max(0.0) as i32;
        let x1 = ((x + width).min(self.overlay.width() as f32)) as i32;
        let y1 = ((y + height).min(self.overlay.height() as f32)) as i32;
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32))
    }
}

fn frame_to_rgba(frame: &Frame) -> RgbaImage {
    let (w, h) = (frame.width(), frame.height());
    if frame.channels() == 4 {
        RgbaImage::from_raw(w, h, frame.data().to_vec())
            .expect("frame buffer length matches dimensions")
    } else {
        let mut out = RgbaImage::new(w, h);
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            let (r, g, b) = frame.rgb(x, y);
            *pixel = Rgba([r, g, b, 255]);
        }
        out
    }
}

fn opaque(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

impl DrawSurface for ImageSurface {
    fn width(&self) -> u32 {
        self.overlay.width()
    }

    fn height(&self) -> u32 {
        self.overlay.height()
    }

    fn clear(&mut self) {
        for pixel in self.overlay.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        if let Some(rect) = self.clip(x, y, width, height) {
            draw_hollow_rect_mut(&mut self.overlay, rect, opaque(color));
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        if let Some(rect) = self.clip(x, y, width, height) {
            draw_filled_rect_mut(&mut self.overlay, rect, opaque(color));
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color) {
        let Some(font) = self.font.as_ref() else {
            log::debug!("no font configured, skipping label text");
            return;
        };
        draw_text_mut(
            &mut self.overlay,
            opaque(color),
            x as i32,
            y as i32,
            self.font_scale,
            font,
            text,
        );
    }
}

// Lets a caller keep a handle on the surface (for compositing/export)
// while the session owns the `DrawSurface`.
impl DrawSurface for Arc<Mutex<ImageSurface>> {
    fn width(&self) -> u32 {
        self.lock().expect("surface lock poisoned").width()
    }

    fn height(&self) -> u32 {
        self.lock().expect("surface lock poisoned").height()
    }

    fn clear(&mut self) {
        self.lock().expect("surface lock poisoned").clear();
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.lock()
            .expect("surface lock poisoned")
            .stroke_rect(x, y, width, height, color);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.lock()
            .expect("surface lock poisoned")
            .fill_rect(x, y, width, height, color);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color) {
        self.lock()
            .expect("surface lock poisoned")
            .fill_text(text, x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color { r: 255, g: 0, b: 0 };

    #[test]
    fn test_new_surface_is_transparent() {
        let surface = ImageSurface::new(8, 8);
        assert!(surface.overlay().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_fill_rect_sets_pixels() {
        let mut surface = ImageSurface::new(8, 8);
        surface.fill_rect(2.0, 2.0, 3.0, 3.0, RED);
        assert_eq!(surface.overlay().get_pixel(2, 2), &Rgba([255, 0, 0, 255]));
        assert_eq!(surface.overlay().get_pixel(4, 4), &Rgba([255, 0, 0, 255]));
        // outside the rect stays transparent
        assert_eq!(surface.overlay().get_pixel(5, 5)[3], 0);
    }

    #[test]
    fn test_stroke_rect_leaves_interior_empty() {
        let mut surface = ImageSurface::new(8, 8);
        surface.stroke_rect(1.0, 1.0, 5.0, 5.0, RED);
        assert_eq!(surface.overlay().get_pixel(1, 1)[3], 255);
        assert_eq!(surface.overlay().get_pixel(3, 3)[3], 0);
    }

    #[test]
    fn test_clear_resets_to_transparent() {
        let mut surface = ImageSurface::new(8, 8);
        surface.fill_rect(0.0, 0.0, 8.0, 8.0, RED);
        surface.clear();
        assert!(surface.overlay().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_out_of_bounds_rect_is_clipped() {
        let mut surface = ImageSurface::new(8, 8);
        surface.fill_rect(6.0, 6.0, 10.0, 10.0, RED);
        assert_eq!(surface.overlay().get_pixel(7, 7)[3], 255);
    }

    #[test]
    fn test_fully_off_surface_rect_is_dropped() {
        let mut surface = ImageSurface::new(8, 8);
        surface.fill_rect(20.0, 20.0, 5.0, 5.0, RED);
        surface.stroke_rect(-10.0, -10.0, 5.0, 5.0, RED);
        assert!(surface.overlay().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_fill_text_without_font_is_noop() {
        let mut surface = ImageSurface::new(8, 8);
        surface.fill_text("cat", 0.0, 0.0, RED);
        assert!(surface.overlay().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_composite_over_blends_opaque_overlay() {
        let mut surface = ImageSurface::new(2, 2);
        surface.fill_rect(0.0, 0.0, 1.0, 1.0, RED);

        let frame = Frame::new(vec![0u8; 2 * 2 * 3], 2, 2, 3, 0);
        let out = surface.composite_over(&frame);
        assert_eq!(out.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        // untouched pixel keeps the frame content
        assert_eq!(out.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_composite_over_rgba_frame() {
        let mut surface = ImageSurface::new(2, 1);
        surface.fill_rect(1.0, 0.0, 1.0, 1.0, RED);

        let frame = Frame::new(vec![10, 20, 30, 255, 40, 50, 60, 255], 2, 1, 4, 0);
        let out = surface.composite_over(&frame);
        assert_eq!(out.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(out.get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_shared_surface_draws_through_handle() {
        let shared = Arc::new(Mutex::new(ImageSurface::new(8, 8)));
        let mut handle: Box<dyn DrawSurface> = Box::new(shared.clone());
        handle.fill_rect(0.0, 0.0, 2.0, 2.0, RED);
        assert_eq!(
            shared.lock().unwrap().overlay().get_pixel(0, 0),
            &Rgba([255, 0, 0, 255])
        );
    }
}
