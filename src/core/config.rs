//! Experiment and server configuration with documented constants
//!
//! All magic numbers of the duel are collected here with explanations of
//! their purpose and how they interact with each other.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::core::error::{DuelError, Result};

/// Configuration for the simulation, the opponent and the frame encoder
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    // === TIMING ===
    /// Fixed simulation steps per second
    ///
    /// Every step advances the engine by `1 / tick_rate` seconds and
    /// produces exactly one frame.
    pub tick_rate: u32,

    /// Rounds per experiment
    pub total_rounds: u32,

    /// Number of countdown counts before a round starts (one second each)
    pub countdown_counts: u8,

    /// How long the round-end panel stays up before the next round (seconds)
    pub round_end_seconds: f32,

    // === TRACK GEOMETRY (screen units, y grows downward) ===
    /// Starting y coordinate of both agents
    pub start_y: f32,

    /// Distance from the start line to progress 100
    ///
    /// Progress is `(start_y - y) / track_distance * 100`, so with the
    /// defaults an agent finishes at y = 0.
    pub track_distance: f32,

    /// y coordinate below which the outer lanes begin merging
    ///
    /// Must lie between the finish (start_y - track_distance) and start_y.
    pub merge_y: f32,

    /// x coordinate of the shared center lane
    pub center_x: f32,

    /// Starting x coordinate of the player (left lane)
    pub player_start_x: f32,

    /// Starting x coordinate of the opponent (right lane)
    pub opponent_start_x: f32,

    /// Horizontal distance at which a merging agent snaps onto the center lane
    ///
    /// The merge approach is proportional to the remaining distance and
    /// therefore asymptotic; without a snap an agent would never reach the
    /// center lane.
    pub merge_snap_distance: f32,

    // === MOTION ===
    /// Upper bound on speed change per second
    ///
    /// At 20, going from standstill to the fastest level (50) takes 2.5s.
    pub max_acceleration: f32,

    /// Target speeds for the four discrete levels (slow, medium, fast, fastest)
    pub speed_levels: [f32; 4],

    /// Speed choices at or above this count as "high speed" in the results
    pub high_speed_threshold: f32,

    // === OPPONENT ===
    /// Player speed above which the adaptive opponent leans faster
    pub adaptive_threshold: f32,

    /// Random offset range added to the player's speed when it is above the threshold
    pub adaptive_offset_fast: (f32, f32),

    /// Random offset range added to the player's speed when it is at or below the threshold
    pub adaptive_offset_slow: (f32, f32),

    /// Seed for opponent strategy selection
    ///
    /// When set, every session derives its own seed from it so runs are
    /// reproducible. When unset, sessions are seeded from entropy.
    pub seed: Option<u64>,

    // === POINTS ===
    /// Points for winning a round
    pub win_points: u32,

    /// Points each agent gets on a tie
    pub tie_points: u32,

    // === FRAMES ===
    /// Frame width in pixels
    pub frame_width: u32,

    /// Frame height in pixels
    pub frame_height: u32,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            total_rounds: 10,
            countdown_counts: 3,
            round_end_seconds: 3.0,

            start_y: 500.0,
            track_distance: 500.0,
            merge_y: 300.0,
            center_x: 400.0,
            player_start_x: 200.0,
            opponent_start_x: 600.0,
            merge_snap_distance: 0.5,

            max_acceleration: 20.0,
            speed_levels: [20.0, 30.0, 40.0, 50.0],
            high_speed_threshold: 40.0,

            adaptive_threshold: 35.0,
            adaptive_offset_fast: (-5.0, 10.0),
            adaptive_offset_slow: (-10.0, 5.0),
            seed: None,

            win_points: 10,
            tie_points: 5,

            frame_width: 800,
            frame_height: 600,
        }
    }
}

impl DuelConfig {
    /// Duration of one simulation step in seconds
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Wall-clock interval between two ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate))
    }

    /// y coordinate at which progress reaches 100
    pub fn finish_y(&self) -> f32 {
        self.start_y - self.track_distance
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.tick_rate == 0 {
            return Err("tick_rate must be positive".into());
        }

        if self.total_rounds == 0 {
            return Err("total_rounds must be at least 1".into());
        }

        if self.countdown_counts == 0 {
            return Err("countdown_counts must be at least 1".into());
        }

        if self.track_distance <= 0.0 {
            return Err(format!(
                "track_distance ({}) must be positive",
                self.track_distance
            ));
        }

        // Merge threshold has to be reachable before the finish
        if self.merge_y <= self.finish_y() || self.merge_y > self.start_y {
            return Err(format!(
                "merge_y ({}) must lie in ({}, {}]",
                self.merge_y,
                self.finish_y(),
                self.start_y
            ));
        }

        if self.max_acceleration <= 0.0 {
            return Err("max_acceleration must be positive".into());
        }

        if self.speed_levels[0] < 0.0 || self.speed_levels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!(
                "speed_levels ({:?}) must be non-negative and strictly ascending",
                self.speed_levels
            ));
        }

        if self.adaptive_offset_fast.0 >= self.adaptive_offset_fast.1
            || self.adaptive_offset_slow.0 >= self.adaptive_offset_slow.1
        {
            return Err("adaptive offset ranges must have min < max".into());
        }

        if self.frame_width == 0 || self.frame_height == 0 {
            return Err("frame dimensions must be non-zero".into());
        }

        Ok(())
    }
}

/// Configuration for the WebSocket gateway
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Capacity of each viewer's outbound queue (messages)
    ///
    /// When a viewer falls this far behind, new frames are dropped instead
    /// of stalling the tick loop.
    pub outbound_queue: usize,

    /// Upper bound on waiting for queue space for non-frame events (ms)
    pub send_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            outbound_queue: 64,
            send_timeout_ms: 250,
        }
    }
}

impl ServerConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.outbound_queue == 0 {
            return Err("outbound_queue must be at least 1".into());
        }
        Ok(())
    }
}

/// Top-level configuration file layout
///
/// ```toml
/// [server]
/// port = 8000
///
/// [duel]
/// total_rounds = 10
/// seed = 42
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub duel: DuelConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string and validate it
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| DuelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.server.validate().map_err(DuelError::Config)?;
        self.duel.validate().map_err(DuelError::Config)
    }
}
