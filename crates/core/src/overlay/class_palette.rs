use crate::overlay::domain::draw_surface::Color;

/// Golden-angle hue step in degrees. Successive class hues land maximally
/// far apart no matter how many classes the model has.
const GOLDEN_ANGLE: f32 = 137.50776;

const SATURATION: f32 = 0.70;
const LIGHTNESS: f32 = 0.50;

/// Deterministic per-class colors, precomputed once for a given class
/// count and cached.
#[derive(Clone, Debug)]
pub struct ClassPalette {
    colors: Vec<Color>,
}

impl ClassPalette {
    pub fn new(class_count: usize) -> Self {
        let colors = (0..class_count.max(1))
            .map(|id| hsl_to_rgb(class_hue(id), SATURATION, LIGHTNESS))
            .collect();
        Self { colors }
    }

    pub fn color(&self, class_id: usize) -> Color {
        self.colors[class_id % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn class_hue(class_id: usize) -> f32 {
    (class_id as f32 * GOLDEN_ANGLE) % 360.0
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Color {
        r: ((r + m) * 255.0) as u8,
        g: ((g + m) * 255.0) as u8,
        b: ((b + m) * 255.0) as u8,
    }
}
