//! Serializable view of the engine state consumed by frame encoders

use serde::{Deserialize, Serialize};

use crate::core::types::Side;
use crate::simulation::agent::{Agent, Lane};
use crate::simulation::engine::SessionState;
use crate::simulation::results::Winner;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub side: Side,
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub progress: f32,
    pub lane: Lane,
}

impl From<&Agent> for AgentView {
    fn from(agent: &Agent) -> Self {
        Self {
            side: agent.side,
            x: agent.position.x,
            y: agent.position.y,
            speed: agent.speed,
            progress: agent.progress,
            lane: agent.lane,
        }
    }
}

/// What is drawn on top of the track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    None,
    Countdown { count: u8 },
    RoundEnd {
        winner: Winner,
        seconds_left: f32,
        final_round: bool,
    },
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub state: SessionState,
    pub round: u32,
    pub total_rounds: u32,
    pub player_score: u32,
    pub opponent_score: u32,
    pub player: AgentView,
    pub opponent: AgentView,
    pub overlay: Overlay,
}
