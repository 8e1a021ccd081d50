//! Deterministic policies for tests and tooling

use super::{PolicySelector, PolicyView, TargetPolicy};

/// Always targets the same speed
#[derive(Debug, Clone, Copy)]
pub struct ConstantPolicy(pub f32);

impl TargetPolicy for ConstantPolicy {
    fn label(&self) -> &'static str {
        "constant"
    }

    fn next_target_speed(&mut self, _view: &PolicyView<'_>, _dt: f32) -> f32 {
        self.0
    }
}

/// Plays a fixed target speed per round, cycling through the script
#[derive(Debug, Clone)]
pub struct ScriptedSelector {
    speeds: Vec<f32>,
}

impl ScriptedSelector {
    pub fn new(speeds: Vec<f32>) -> Self {
        Self { speeds }
    }

    /// Same speed every round
    pub fn constant(speed: f32) -> Self {
        Self::new(vec![speed])
    }
}

impl PolicySelector for ScriptedSelector {
    fn select(&mut self, round: u32) -> Box<dyn TargetPolicy> {
        let speed = if self.speeds.is_empty() {
            0.0
        } else {
            let idx = (round.saturating_sub(1) as usize) % self.speeds.len();
            self.speeds[idx]
        };
        Box::new(ConstantPolicy(speed))
    }
}
