//! Opponent policies
//!
//! The engine asks a [`TargetPolicy`] for the opponent's target speed on
//! every active tick. A [`PolicySelector`] hands out a fresh policy at the
//! start of each round, so the strategy stays fixed for one round and is
//! re-rolled for the next.

pub mod scripted;
pub mod strategy;

pub use scripted::{ConstantPolicy, ScriptedSelector};
pub use strategy::{FixedSelector, RandomSelector, Strategy, StrategyPolicy};

use crate::simulation::agent::Agent;

/// What a policy may look at when choosing a target
#[derive(Debug, Clone, Copy)]
pub struct PolicyView<'a> {
    pub player: &'a Agent,
    pub opponent: &'a Agent,
    pub round: u32,
}

/// Produces the opponent's next target speed
pub trait TargetPolicy: Send {
    /// Short name shown in logs
    fn label(&self) -> &'static str;

    fn next_target_speed(&mut self, view: &PolicyView<'_>, dt: f32) -> f32;
}

/// Supplies the policy for a new round
pub trait PolicySelector: Send {
    fn select(&mut self, round: u32) -> Box<dyn TargetPolicy>;
}
