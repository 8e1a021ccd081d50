//! The four built-in opponent strategies

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{PolicySelector, PolicyView, TargetPolicy};
use crate::core::config::DuelConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Prefers the two fastest levels
    Aggressive,
    /// Prefers the two slowest levels
    Cautious,
    /// Shadows the player's current speed with a random offset
    Adaptive,
    /// Any of the four levels
    Random,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Aggressive,
        Strategy::Cautious,
        Strategy::Adaptive,
        Strategy::Random,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Aggressive => "aggressive",
            Strategy::Cautious => "cautious",
            Strategy::Adaptive => "adaptive",
            Strategy::Random => "random",
        }
    }
}

/// A strategy bound to the tuning it needs and its own random stream
#[derive(Debug, Clone)]
pub struct StrategyPolicy {
    strategy: Strategy,
    levels: [f32; 4],
    adaptive_threshold: f32,
    offset_fast: (f32, f32),
    offset_slow: (f32, f32),
    rng: ChaCha8Rng,
}

impl StrategyPolicy {
    pub fn new(strategy: Strategy, config: &DuelConfig, rng: ChaCha8Rng) -> Self {
        Self {
            strategy,
            levels: config.speed_levels,
            adaptive_threshold: config.adaptive_threshold,
            offset_fast: config.adaptive_offset_fast,
            offset_slow: config.adaptive_offset_slow,
            rng,
        }
    }

    fn pick(&mut self, choices: &[f32]) -> f32 {
        choices.choose(&mut self.rng).copied().unwrap_or(0.0)
    }
}

impl TargetPolicy for StrategyPolicy {
    fn label(&self) -> &'static str {
        self.strategy.name()
    }

    fn next_target_speed(&mut self, view: &PolicyView<'_>, _dt: f32) -> f32 {
        let levels = self.levels;
        match self.strategy {
            Strategy::Aggressive => self.pick(&levels[2..]),
            Strategy::Cautious => self.pick(&levels[..2]),
            Strategy::Adaptive => {
                let player_speed = view.player.speed;
                let (low, high) = if player_speed > self.adaptive_threshold {
                    self.offset_fast
                } else {
                    self.offset_slow
                };
                (player_speed + self.rng.gen_range(low..high)).max(0.0)
            }
            Strategy::Random => self.pick(&levels),
        }
    }
}

/// Picks a strategy uniformly at random for every round
#[derive(Debug, Clone)]
pub struct RandomSelector {
    config: DuelConfig,
    rng: ChaCha8Rng,
}

impl RandomSelector {
    pub fn new(config: &DuelConfig, seed: u64) -> Self {
        Self {
            config: config.clone(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy(config: &DuelConfig) -> Self {
        Self {
            config: config.clone(),
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl PolicySelector for RandomSelector {
    fn select(&mut self, _round: u32) -> Box<dyn TargetPolicy> {
        let strategy = Strategy::ALL[self.rng.gen_range(0..Strategy::ALL.len())];
        let stream = ChaCha8Rng::seed_from_u64(self.rng.gen());
        Box::new(StrategyPolicy::new(strategy, &self.config, stream))
    }
}

/// Always hands out the same strategy
#[derive(Debug, Clone)]
pub struct FixedSelector {
    strategy: Strategy,
    config: DuelConfig,
    rng: ChaCha8Rng,
}

impl FixedSelector {
    pub fn new(strategy: Strategy, config: &DuelConfig, seed: u64) -> Self {
        Self {
            strategy,
            config: config.clone(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl PolicySelector for FixedSelector {
    fn select(&mut self, _round: u32) -> Box<dyn TargetPolicy> {
        let stream = ChaCha8Rng::seed_from_u64(self.rng.gen());
        Box::new(StrategyPolicy::new(self.strategy, &self.config, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::agent::Agent;

    fn sample(strategy: Strategy, player_speed: f32, n: usize) -> Vec<f32> {
        let config = DuelConfig::default();
        let mut policy = StrategyPolicy::new(strategy, &config, ChaCha8Rng::seed_from_u64(3));
        let mut player = Agent::player(&config);
        player.speed = player_speed;
        let opponent = Agent::opponent(&config);
        let view = PolicyView {
            player: &player,
            opponent: &opponent,
            round: 1,
        };
        (0..n).map(|_| policy.next_target_speed(&view, config.dt())).collect()
    }

    #[test]
    fn test_aggressive_uses_fast_levels() {
        let speeds = sample(Strategy::Aggressive, 0.0, 200);
        assert!(speeds.iter().all(|&s| s == 40.0 || s == 50.0));
        assert!(speeds.contains(&40.0) && speeds.contains(&50.0));
    }

    #[test]
    fn test_cautious_uses_slow_levels() {
        let speeds = sample(Strategy::Cautious, 0.0, 200);
        assert!(speeds.iter().all(|&s| s == 20.0 || s == 30.0));
    }

    #[test]
    fn test_random_covers_all_levels() {
        let speeds = sample(Strategy::Random, 0.0, 400);
        for level in [20.0, 30.0, 40.0, 50.0] {
            assert!(speeds.contains(&level));
        }
    }

    #[test]
    fn test_adaptive_offsets_depend_on_player_speed() {
        let fast = sample(Strategy::Adaptive, 45.0, 300);
        assert!(fast.iter().all(|&s| (40.0..55.0).contains(&s)));

        let slow = sample(Strategy::Adaptive, 30.0, 300);
        assert!(slow.iter().all(|&s| (20.0..35.0).contains(&s)));
    }

    #[test]
    fn test_adaptive_never_negative() {
        let speeds = sample(Strategy::Adaptive, 0.0, 300);
        assert!(speeds.iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn test_random_selector_is_reproducible() {
        let config = DuelConfig::default();
        let mut a = RandomSelector::new(&config, 11);
        let mut b = RandomSelector::new(&config, 11);
        let labels_a: Vec<_> = (1..=20).map(|r| a.select(r).label()).collect();
        let labels_b: Vec<_> = (1..=20).map(|r| b.select(r).label()).collect();
        assert_eq!(labels_a, labels_b);
    }

    #[test]
    fn test_fixed_selector() {
        let config = DuelConfig::default();
        let mut selector = FixedSelector::new(Strategy::Cautious, &config, 1);
        for round in 1..=5 {
            assert_eq!(selector.select(round).label(), "cautious");
        }
    }
}
