use thiserror::Error;

#[derive(Error, Debug)]
pub enum DuelError {
    #[error("Frame encoding failed: {0}")]
    Encoding(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl From<image::ImageError> for DuelError {
    fn from(err: image::ImageError) -> Self {
        DuelError::Encoding(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DuelError>;
