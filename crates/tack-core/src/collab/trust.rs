use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use tack_model::ClaimedTask;

use crate::error::CoreError;

/// What a verifier is asked to establish before a task may run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainOfTrust {
    pub job_type: String,
    pub task: ClaimedTask,
    pub work_dir: PathBuf,
}

impl ChainOfTrust {
    pub fn new(job_type: impl Into<String>, task: ClaimedTask, work_dir: PathBuf) -> Self {
        Self {
            job_type: job_type.into(),
            task,
            work_dir,
        }
    }
}

#[async_trait]
pub trait TrustVerifier: Send + Sync + 'static {
    /// `Ok(())` when the chain is trusted; a [`crate::WorkerError`] with its own severity otherwise.
    async fn verify(&self, chain: &ChainOfTrust) -> Result<(), CoreError>;
}
