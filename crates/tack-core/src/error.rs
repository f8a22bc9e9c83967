use tack_model::ExitStatus;
use thiserror::Error;

/// Structured failure that carries its own severity.
///
/// Absorbed by the orchestrator: folded into the running status, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} [{status}]")]
pub struct WorkerError {
    status: ExitStatus,
    reason: String,
}

impl WorkerError {
    pub fn new(status: ExitStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Verification was interrupted by a shutdown request.
    pub fn chain_of_trust_aborted() -> Self {
        Self::new(
            ExitStatus::WorkerShutdown,
            "chain of trust verification was aborted",
        )
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Errors crossing the collaborator boundary.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Worker(#[from] WorkerError),
    /// Network-level failure talking to a remote service.
    #[error("transport error: {0}")]
    Transport(String),
    /// The queue no longer considers this worker the owner of the run.
    #[error("lease lost: {0}")]
    LeaseLost(String),
    /// The operation was interrupted through the cancel token.
    #[error("cancelled")]
    Cancelled,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl CoreError {
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
}
