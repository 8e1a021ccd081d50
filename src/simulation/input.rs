//! Discrete speed levels and the key table that selects them

use serde::{Deserialize, Serialize};

use crate::core::config::DuelConfig;

/// The four speeds a participant can choose from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedLevel {
    Slow,
    Medium,
    Fast,
    Fastest,
}

impl SpeedLevel {
    pub const ALL: [SpeedLevel; 4] = [
        SpeedLevel::Slow,
        SpeedLevel::Medium,
        SpeedLevel::Fast,
        SpeedLevel::Fastest,
    ];

    /// Key table: number keys 2 through 5, slowest to fastest
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "2" => Some(SpeedLevel::Slow),
            "3" => Some(SpeedLevel::Medium),
            "4" => Some(SpeedLevel::Fast),
            "5" => Some(SpeedLevel::Fastest),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SpeedLevel::Slow => "2",
            SpeedLevel::Medium => "3",
            SpeedLevel::Fast => "4",
            SpeedLevel::Fastest => "5",
        }
    }

    fn index(&self) -> usize {
        match self {
            SpeedLevel::Slow => 0,
            SpeedLevel::Medium => 1,
            SpeedLevel::Fast => 2,
            SpeedLevel::Fastest => 3,
        }
    }

    /// Target speed for this level under the given config
    pub fn speed(&self, config: &DuelConfig) -> f32 {
        config.speed_levels[self.index()]
    }
}
