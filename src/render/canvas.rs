//! Minimal raster drawing on an RGB image
//!
//! Coordinates are signed so shapes may hang off the edges; everything is
//! clipped to the image bounds.

use image::RgbImage;

use super::colors::Color;
use super::font::{self, ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};

pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn clear(&mut self, color: Color) {
        let pixel = color.to_rgb();
        for p in self.image.pixels_mut() {
            *p = pixel;
        }
    }

    fn plot(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        let pixel = if color.a >= 1.0 {
            color.to_rgb()
        } else {
            color.blend_over(*self.image.get_pixel(x, y))
        };
        self.image.put_pixel(x, y, pixel);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width() as i32);
        let y1 = (y + h).min(self.height() as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.plot(px, py, color);
            }
        }
    }

    /// Rectangle outline drawn inward from the given bounds
    pub fn stroke_rect(&mut self, x: i32, y: i32, w: i32, h: i32, thickness: i32, color: Color) {
        let t = thickness.max(1).min(w.min(h) / 2).max(1);
        self.fill_rect(x, y, w, t, color);
        self.fill_rect(x, y + h - t, w, t, color);
        self.fill_rect(x, y + t, t, h - 2 * t, color);
        self.fill_rect(x + w - t, y + t, t, h - 2 * t, color);
    }

    pub fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32, color: Color) {
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= r2 {
                    self.plot(cx + dx, cy + dy, color);
                }
            }
        }
    }

    pub fn stroke_circle(&mut self, cx: i32, cy: i32, radius: i32, thickness: i32, color: Color) {
        let outer = radius * radius;
        let inner_r = (radius - thickness).max(0);
        let inner = inner_r * inner_r;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let d = dx * dx + dy * dy;
                if d <= outer && d > inner {
                    self.plot(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Draw text with its top-left corner at (x, y)
    pub fn text(&mut self, x: i32, y: i32, text: &str, scale: u32, color: Color) {
        let s = scale.max(1) as i32;
        for (i, c) in text.chars().enumerate() {
            let origin_x = x + i as i32 * ADVANCE as i32 * s;
            for (row, bits) in font::glyph(c).iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(
                            origin_x + col as i32 * s,
                            y + row as i32 * s,
                            s,
                            s,
                            color,
                        );
                    }
                }
            }
        }
    }

    /// Draw text centered on (cx, cy)
    pub fn text_centered(&mut self, cx: i32, cy: i32, text: &str, scale: u32, color: Color) {
        let w = font::text_width(text, scale) as i32;
        let h = (GLYPH_HEIGHT * scale.max(1)) as i32;
        self.text(cx - w / 2, cy - h / 2, text, scale, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

    #[test]
    fn test_fill_rect_clips() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill_rect(-5, -5, 8, 8, RED);
        assert_eq!(*canvas.image().get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(*canvas.image().get_pixel(2, 2), Rgb([255, 0, 0]));
        assert_eq!(*canvas.image().get_pixel(3, 3), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_stroke_rect_leaves_interior() {
        let mut canvas = Canvas::new(10, 10);
        canvas.stroke_rect(0, 0, 10, 10, 1, RED);
        assert_eq!(*canvas.image().get_pixel(0, 5), Rgb([255, 0, 0]));
        assert_eq!(*canvas.image().get_pixel(9, 9), Rgb([255, 0, 0]));
        assert_eq!(*canvas.image().get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_text_sets_pixels() {
        let mut canvas = Canvas::new(20, 10);
        canvas.text(0, 0, "1", 1, RED);
        // Top of the '1' stem sits in column 2
        assert_eq!(*canvas.image().get_pixel(2, 0), Rgb([255, 0, 0]));
        assert_eq!(*canvas.image().get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_fill_circle_center() {
        let mut canvas = Canvas::new(21, 21);
        canvas.fill_circle(10, 10, 5, RED);
        assert_eq!(*canvas.image().get_pixel(10, 10), Rgb([255, 0, 0]));
        assert_eq!(*canvas.image().get_pixel(0, 0), Rgb([0, 0, 0]));
    }
}
