//! Simulation of the speed duel
//!
//! Two cars race toward a shared finish. The outer lanes merge into the
//! center lane near the end; whoever gets further first takes the round.

pub mod agent;
pub mod clock;
pub mod engine;
pub mod input;
pub mod results;

pub use agent::{Agent, Lane};
pub use engine::{Engine, SessionState};
pub use input::SpeedLevel;
pub use results::{ExperimentResults, RoundRecord, Winner};
