pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DuelConfig, ServerConfig};
pub use error::{DuelError, Result};
