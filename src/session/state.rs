//! Connection-level session state driven one step at a time
//!
//! `SessionCore` is synchronous: the tick loop in [`super::handle`] calls
//! [`SessionCore::step`] under the session lock and ships whatever messages
//! come back.

use crate::render::FrameEncoder;
use crate::session::protocol::{FramePayload, ServerMessage};
use crate::simulation::engine::{Engine, SessionState};
use crate::simulation::input::SpeedLevel;

/// Result of one loop step
#[derive(Debug, Default)]
pub struct StepOutput {
    pub messages: Vec<ServerMessage>,
    /// False once the loop should stop (paused, complete or failed)
    pub keep_running: bool,
}

pub struct SessionCore {
    engine: Engine,
    encoder: Box<dyn FrameEncoder>,
    running: bool,
    failed: bool,
    completion_sent: bool,
}

impl SessionCore {
    pub fn new(engine: Engine, encoder: Box<dyn FrameEncoder>) -> Self {
        Self {
            engine,
            encoder,
            running: false,
            failed: false,
            completion_sent: false,
        }
    }

    /// Begin or resume. Returns whether the tick loop should be running.
    pub fn start(&mut self) -> bool {
        if self.failed || self.engine.state() == SessionState::Complete {
            return false;
        }
        self.engine.begin();
        self.running = true;
        true
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Throw everything away and start over from round 1
    pub fn reset(&mut self) -> bool {
        self.engine.reset();
        self.running = false;
        self.failed = false;
        self.completion_sent = false;
        self.start()
    }

    /// Route a key event. Returns true when it reached the engine.
    pub fn handle_input(&mut self, key: &str, pressed: bool) -> bool {
        if !pressed || !self.running {
            return false;
        }
        match SpeedLevel::from_key(key) {
            Some(level) => {
                self.engine.apply_player_input(level);
                true
            }
            None => false,
        }
    }

    /// Advance one tick and produce the messages for the viewer
    pub fn step(&mut self) -> StepOutput {
        if !self.running {
            return StepOutput::default();
        }

        let dt = self.engine.config().dt();
        self.engine.step(dt);

        let mut messages = Vec::with_capacity(2);
        match self.encoder.encode(&self.engine.snapshot()) {
            Ok(frame) => messages.push(ServerMessage::Frame {
                frame: FramePayload::from(&frame),
            }),
            Err(e) => {
                tracing::error!(error = %e, tick = self.engine.current_tick(), "Frame encoding failed");
                self.failed = true;
                self.running = false;
                messages.push(ServerMessage::Error {
                    message: format!("Experiment failed: {}", e),
                });
                return StepOutput {
                    messages,
                    keep_running: false,
                };
            }
        }

        if self.engine.state() == SessionState::Complete && !self.completion_sent {
            if let Some(results) = self.engine.results() {
                tracing::info!(
                    score = results.score,
                    opponent = results.opponent_score,
                    win_rate = results.win_rate,
                    "Experiment complete"
                );
                messages.push(ServerMessage::ExperimentComplete {
                    results: results.clone(),
                });
            }
            self.completion_sent = true;
            self.running = false;
        }

        StepOutput {
            messages,
            keep_running: self.running,
        }
    }

    pub fn state(&self) -> SessionState {
        self.engine.state()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}
