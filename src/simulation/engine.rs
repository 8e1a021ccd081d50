//! Round state machine for the two-agent duel
//!
//! Idle -> CountingDown -> RoundActive -> RoundEnded -> (CountingDown | Complete)
//!
//! The engine is pure: it advances by whatever `dt` it is given and never
//! draws or sends anything. Renderers read it through [`Engine::snapshot`].

use serde::{Deserialize, Serialize};

use crate::core::config::DuelConfig;
use crate::core::types::Tick;
use crate::opponent::{PolicySelector, PolicyView, TargetPolicy};
use crate::render::snapshot::{AgentView, Overlay, RenderSnapshot};
use crate::simulation::agent::Agent;
use crate::simulation::clock::{Clock, SystemClock};
use crate::simulation::input::SpeedLevel;
use crate::simulation::results::{ExperimentResults, RoundRecord, Winner};

/// Float tolerance for timers driven by repeated `1 / tick_rate` steps
const TIMER_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    CountingDown,
    RoundActive,
    RoundEnded,
    Complete,
}

/// Internal phase with the timers each state needs
#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    CountingDown { remaining: u8, elapsed: f32 },
    RoundActive,
    RoundEnded { remaining: f32, winner: Winner },
    Complete,
}

pub struct Engine {
    config: DuelConfig,
    selector: Box<dyn PolicySelector>,
    policy: Box<dyn TargetPolicy>,
    clock: Box<dyn Clock>,

    phase: Phase,
    round: u32,
    tick: Tick,
    /// Simulated seconds since the experiment began
    elapsed: f64,

    pub player: Agent,
    pub opponent: Agent,
    player_score: u32,
    opponent_score: u32,

    reaction_times: Vec<f64>,
    speed_choices: Vec<f32>,
    rounds: Vec<RoundRecord>,
    results: Option<ExperimentResults>,
}

impl Engine {
    pub fn new(config: DuelConfig, mut selector: Box<dyn PolicySelector>) -> Self {
        let policy = selector.select(1);
        Self {
            player: Agent::player(&config),
            opponent: Agent::opponent(&config),
            config,
            selector,
            policy,
            clock: Box::new(SystemClock),
            phase: Phase::Idle,
            round: 1,
            tick: 0,
            elapsed: 0.0,
            player_score: 0,
            opponent_score: 0,
            reaction_times: Vec::new(),
            speed_choices: Vec::new(),
            rounds: Vec::new(),
            results: None,
        }
    }

    /// Replace the clock used for round timestamps
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Discard everything and return to Idle at round 1
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.round = 1;
        self.tick = 0;
        self.elapsed = 0.0;
        self.player = Agent::player(&self.config);
        self.opponent = Agent::opponent(&self.config);
        self.policy = self.selector.select(1);
        self.player_score = 0;
        self.opponent_score = 0;
        self.reaction_times.clear();
        self.speed_choices.clear();
        self.rounds.clear();
        self.results = None;
    }

    /// Leave Idle and start the first countdown. No-op in any other state.
    pub fn begin(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = self.countdown();
            tracing::debug!(
                round = self.round,
                strategy = self.policy.label(),
                "Experiment started"
            );
        }
    }

    fn countdown(&self) -> Phase {
        Phase::CountingDown {
            remaining: self.config.countdown_counts,
            elapsed: 0.0,
        }
    }

    /// Advance the state machine by one step of `dt` seconds
    pub fn step(&mut self, dt: f32) {
        match self.phase {
            Phase::Idle | Phase::Complete => return,
            Phase::CountingDown { remaining, elapsed } => {
                let elapsed = elapsed + dt;
                self.phase = if elapsed + TIMER_EPSILON >= 1.0 {
                    match remaining.saturating_sub(1) {
                        0 => Phase::RoundActive,
                        left => Phase::CountingDown {
                            remaining: left,
                            elapsed: 0.0,
                        },
                    }
                } else {
                    Phase::CountingDown { remaining, elapsed }
                };
            }
            Phase::RoundActive => {
                self.update_opponent(dt);
                self.tick(dt);
            }
            Phase::RoundEnded { remaining, winner } => {
                let remaining = remaining - dt;
                if remaining <= TIMER_EPSILON {
                    self.start_next_round();
                } else {
                    self.phase = Phase::RoundEnded { remaining, winner };
                }
            }
        }

        self.tick += 1;
        self.elapsed += f64::from(dt);
    }

    /// Move both agents and check for the end of the round
    pub fn tick(&mut self, dt: f32) {
        if self.phase != Phase::RoundActive {
            return;
        }

        self.player.update(dt, &self.config);
        self.opponent.update(dt, &self.config);

        if self.player.finished() || self.opponent.finished() {
            self.end_round();
        }
    }

    /// Ask the round's policy for the opponent's target speed
    pub fn update_opponent(&mut self, dt: f32) {
        if self.phase != Phase::RoundActive {
            return;
        }

        let view = PolicyView {
            player: &self.player,
            opponent: &self.opponent,
            round: self.round,
        };
        let target = self.policy.next_target_speed(&view, dt);
        self.opponent.target_speed = target.max(0.0);
    }

    /// Score the round. Only the first call per round has any effect.
    pub fn end_round(&mut self) -> Option<&RoundRecord> {
        if self.phase != Phase::RoundActive {
            return None;
        }

        let (winner, player_points, opponent_points) =
            if self.player.progress > self.opponent.progress {
                (Winner::Player, self.config.win_points, 0)
            } else if self.opponent.progress > self.player.progress {
                (Winner::Opponent, 0, self.config.win_points)
            } else {
                (Winner::Tie, self.config.tie_points, self.config.tie_points)
            };

        self.player_score += player_points;
        self.opponent_score += opponent_points;

        self.rounds.push(RoundRecord {
            round: self.round,
            player_speed: self.player.speed,
            opponent_speed: self.opponent.speed,
            player_score: player_points,
            opponent_score: opponent_points,
            winner,
            reaction_time: self.reaction_times.last().copied().unwrap_or(0.0),
            timestamp: self.clock.now_millis(),
        });

        self.phase = Phase::RoundEnded {
            remaining: self.config.round_end_seconds,
            winner,
        };

        tracing::debug!(
            round = self.round,
            ?winner,
            player = self.player_score,
            opponent = self.opponent_score,
            "Round ended"
        );

        self.rounds.last()
    }

    fn start_next_round(&mut self) {
        if self.round >= self.config.total_rounds {
            self.complete();
            return;
        }

        self.round += 1;
        self.player = Agent::player(&self.config);
        self.opponent = Agent::opponent(&self.config);
        self.policy = self.selector.select(self.round);
        self.phase = self.countdown();

        tracing::debug!(
            round = self.round,
            strategy = self.policy.label(),
            "Next round"
        );
    }

    fn complete(&mut self) {
        if self.results.is_some() {
            return;
        }

        self.phase = Phase::Complete;
        self.results = Some(ExperimentResults::compute(
            self.player_score,
            self.opponent_score,
            self.config.total_rounds,
            self.config.high_speed_threshold,
            &self.reaction_times,
            &self.speed_choices,
            &self.rounds,
        ));
    }

    /// Apply a speed choice from the participant
    ///
    /// The target speed always changes. A reaction time sample is only
    /// recorded while a round is being raced.
    pub fn apply_player_input(&mut self, level: SpeedLevel) {
        if self.phase == Phase::Complete {
            return;
        }

        let speed = level.speed(&self.config);
        self.player.target_speed = speed;
        self.speed_choices.push(speed);

        if self.phase == Phase::RoundActive {
            self.reaction_times.push(self.elapsed * 1000.0);
        }
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::CountingDown { .. } => SessionState::CountingDown,
            Phase::RoundActive => SessionState::RoundActive,
            Phase::RoundEnded { .. } => SessionState::RoundEnded,
            Phase::Complete => SessionState::Complete,
        }
    }

    pub fn config(&self) -> &DuelConfig {
        &self.config
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn scores(&self) -> (u32, u32) {
        (self.player_score, self.opponent_score)
    }

    pub fn strategy_label(&self) -> &'static str {
        self.policy.label()
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn reaction_times(&self) -> &[f64] {
        &self.reaction_times
    }

    pub fn speed_choices(&self) -> &[f32] {
        &self.speed_choices
    }

    /// Present once the experiment is Complete
    pub fn results(&self) -> Option<&ExperimentResults> {
        self.results.as_ref()
    }

    /// Drawing-free description of the current state for a frame encoder
    pub fn snapshot(&self) -> RenderSnapshot {
        let overlay = match self.phase {
            Phase::CountingDown { remaining, .. } => Overlay::Countdown { count: remaining },
            Phase::RoundEnded { remaining, winner } => Overlay::RoundEnd {
                winner,
                seconds_left: remaining.max(0.0),
                final_round: self.round >= self.config.total_rounds,
            },
            Phase::Complete => Overlay::Complete,
            Phase::Idle | Phase::RoundActive => Overlay::None,
        };

        RenderSnapshot {
            state: self.state(),
            round: self.round,
            total_rounds: self.config.total_rounds,
            player_score: self.player_score,
            opponent_score: self.opponent_score,
            player: AgentView::from(&self.player),
            opponent: AgentView::from(&self.opponent),
            overlay,
        }
    }
}
