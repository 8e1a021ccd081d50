//! Agent kinematics: rate-limited speed, forward motion and lane merging

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::config::DuelConfig;
use crate::core::types::Side;

/// Lane an agent is currently driving in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    Left,
    Right,
    Center,
}

/// One of the two cars in a round
#[derive(Debug, Clone)]
pub struct Agent {
    pub side: Side,
    pub position: Vec2,
    pub speed: f32,
    pub target_speed: f32,
    pub lane: Lane,
    /// 0.0-100.0
    pub progress: f32,
}

impl Agent {
    /// Player starts in the left lane
    pub fn player(config: &DuelConfig) -> Self {
        Self::at(Side::Player, config.player_start_x, config.start_y, Lane::Left)
    }

    /// Opponent starts in the right lane
    pub fn opponent(config: &DuelConfig) -> Self {
        Self::at(Side::Opponent, config.opponent_start_x, config.start_y, Lane::Right)
    }

    fn at(side: Side, x: f32, y: f32, lane: Lane) -> Self {
        Self {
            side,
            position: Vec2::new(x, y),
            speed: 0.0,
            target_speed: 0.0,
            lane,
            progress: 0.0,
        }
    }

    /// Advance this agent by `dt` seconds
    pub fn update(&mut self, dt: f32, config: &DuelConfig) {
        if dt <= 0.0 {
            return;
        }

        // Rate-limited approach, never past the target
        let diff = self.target_speed - self.speed;
        let step = (diff.abs().min(config.max_acceleration) * dt).min(diff.abs());
        self.speed += step.copysign(diff);

        self.position.y -= self.speed * dt;

        let travelled = (config.start_y - self.position.y) / config.track_distance * 100.0;
        self.progress = travelled.clamp(0.0, 100.0);

        if self.position.y <= config.merge_y && self.lane != Lane::Center {
            self.merge_toward_center(dt, config);
        }
    }

    fn merge_toward_center(&mut self, dt: f32, config: &DuelConfig) {
        let center = config.center_x;
        let remaining = (self.position.x - center).abs();
        let vertical_ratio = (self.position.y / config.merge_y).clamp(0.0, 1.0);
        let shift = remaining * vertical_ratio * dt;

        let x = match self.lane {
            Lane::Left => (self.position.x + shift).min(center),
            Lane::Right => (self.position.x - shift).max(center),
            Lane::Center => return,
        };

        if (x - center).abs() <= config.merge_snap_distance {
            self.position.x = center;
            self.lane = Lane::Center;
        } else {
            self.position.x = x;
        }
    }

    pub fn finished(&self) -> bool {
        self.progress >= 100.0
    }
}
