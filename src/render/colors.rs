//! Color definitions for the track, agents and overlays

use image::Rgb;

use crate::core::types::Side;
use crate::simulation::results::Winner;

/// RGBA color (0.0 to 1.0 per channel)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Darken color by a factor (0.0 = black, 1.0 = unchanged)
    pub fn darken(&self, factor: f32) -> Self {
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a,
        }
    }

    /// Composite this color over an existing pixel
    pub fn blend_over(&self, dst: Rgb<u8>) -> Rgb<u8> {
        let alpha = self.a.clamp(0.0, 1.0);
        let mix = |src: f32, dst: u8| -> u8 {
            let src = src.clamp(0.0, 1.0) * 255.0;
            (src * alpha + f32::from(dst) * (1.0 - alpha)).round() as u8
        };
        Rgb([mix(self.r, dst[0]), mix(self.g, dst[1]), mix(self.b, dst[2])])
    }

    pub fn to_rgb(&self) -> Rgb<u8> {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb([channel(self.r), channel(self.g), channel(self.b)])
    }
}

pub const BACKGROUND: Color = Color::new(0.94, 0.94, 0.94, 1.0);
pub const ROAD: Color = Color::new(0.39, 0.39, 0.39, 1.0);
pub const MARKING: Color = Color::new(1.0, 1.0, 1.0, 1.0);
pub const WINDSHIELD: Color = Color::new(0.78, 0.78, 0.78, 1.0);
pub const TEXT: Color = Color::new(0.0, 0.0, 0.0, 1.0);
pub const BAR_BACKGROUND: Color = Color::new(0.78, 0.78, 0.78, 1.0);
pub const PANEL: Color = Color::new(1.0, 1.0, 1.0, 0.78);

/// Body color of each car
pub fn side_color(side: Side) -> Color {
    match side {
        Side::Player => Color::new(1.0, 0.0, 0.0, 1.0),   // Red
        Side::Opponent => Color::new(0.0, 0.0, 1.0, 1.0), // Blue
    }
}

/// HUD text color for each car, a little darker than the body
pub fn side_text_color(side: Side) -> Color {
    side_color(side).darken(0.78)
}

/// Title color on the round-end panel
pub fn winner_color(winner: Winner) -> Color {
    match winner {
        Winner::Player => Color::new(0.0, 0.5, 0.0, 1.0),
        Winner::Opponent => Color::new(0.5, 0.0, 0.0, 1.0),
        Winner::Tie => Color::new(0.0, 0.0, 0.5, 1.0),
    }
}
