//! Wire messages exchanged with a viewer
//!
//! Every message is a JSON object with a `type` discriminator.

use serde::{Deserialize, Serialize};

use crate::render::Frame;
use crate::simulation::results::ExperimentResults;

/// Viewer -> server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    Start,
    Pause,
    Reset,
    KeyEvent {
        key: String,
        #[serde(default)]
        pressed: bool,
    },
}

impl ClientMessage {
    /// Parse a text message; anything malformed yields `None`
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePayload {
    pub width: u32,
    pub height: u32,
    /// Base64 PNG
    pub data: String,
}

impl From<&Frame> for FramePayload {
    fn from(frame: &Frame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            data: frame.data_base64(),
        }
    }
}

/// Server -> viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    Frame { frame: FramePayload },
    ExperimentComplete { results: ExperimentResults },
    Error { message: String },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Frame { .. } => "FRAME",
            ServerMessage::ExperimentComplete { .. } => "EXPERIMENT_COMPLETE",
            ServerMessage::Error { .. } => "ERROR",
        }
    }
}
