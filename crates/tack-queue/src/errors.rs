use tack_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("invalid queue config: {0}")]
    Config(String),

    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("queue answered {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("run is no longer owned by this worker: {0}")]
    Conflict(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("artifact {path}: {reason}")]
    Artifact { path: String, reason: String },
}

impl From<QueueError> for CoreError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::Conflict(msg) => CoreError::LeaseLost(msg),
            QueueError::Config(msg) => CoreError::Unexpected(msg),
            other => CoreError::Transport(other.to_string()),
        }
    }
}
