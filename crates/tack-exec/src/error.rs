use tack_core::CoreError;
use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("missing program")]
    MissingProgram,
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}

// None of these is anticipated by the task lifecycle: a worker that cannot start
// its own task script is misconfigured.
impl From<ExecError> for CoreError {
    fn from(e: ExecError) -> Self {
        CoreError::Unexpected(e.to_string())
    }
}
