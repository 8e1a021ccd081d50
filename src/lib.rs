//! Lane Duel - real-time speed bargaining experiment streamed to remote viewers

pub mod core;
pub mod opponent;
pub mod render;
pub mod server;
pub mod session;
pub mod simulation;
