//! Per-viewer sessions and the registry that owns them

pub mod handle;
pub mod manager;
pub mod protocol;
pub mod state;

pub use handle::{LoopTiming, Session};
pub use manager::{default_core, CoreFactory, SessionManager};
pub use protocol::{ClientMessage, FramePayload, ServerMessage};
pub use state::{SessionCore, StepOutput};
