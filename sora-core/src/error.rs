use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoraError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid payload: {0}")]
    Payload(String),

    #[error("Duplicate video id: {0}")]
    DuplicateId(String),

    #[error("Video not found: {0}")]
    NotFound(String),
}

/// Why a generation request was turned away. Rejection never changes state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("a generation is already in progress")]
    AlreadyRunning,
}
