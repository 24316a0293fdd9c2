use thiserror::Error;

pub type Result<T> = std::result::Result<T, DrillError>;

#[derive(Debug, Error)]
pub enum DrillError {
    #[error("level {level} is outside 1..={max}")]
    InvalidLevel { level: u8, max: u8 },

    #[error("persisted record '{key}' is malformed: {reason}")]
    MalformedPersistedState { key: String, reason: String },

    #[error("'{0}' is not a number")]
    InvalidAnswerInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not determine data directory")]
    NoDataDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
