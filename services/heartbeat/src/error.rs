//! Error types for the heartbeat service

/// Errors that can occur in the heartbeat service
#[derive(Debug, thiserror::Error)]
pub enum HeartbeatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("State store error: {0}")]
    Store(String),

    #[error("Notifier error: {0}")]
    Notifier(String),
}

/// Result type alias for heartbeat operations
pub type Result<T> = std::result::Result<T, HeartbeatError>;
