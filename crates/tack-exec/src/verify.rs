use std::{path::PathBuf, process::Stdio};

use async_trait::async_trait;
use tack_core::{ChainOfTrust, CoreError, TrustVerifier, WorkerError};
use tack_model::ExitStatus;
use tracing::{debug, warn};

use crate::{error::ExecError, util::cmd_argv};

pub const CHAIN_FILE: &str = "chain.json";

/// Delegates chain-of-trust verification to an external command.
///
/// The chain is written to `<work_dir>/chain.json` and its path passed as the last argument.
/// A non-zero exit rejects the task as a malformed payload.
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    argv: Vec<String>,
}

impl CommandVerifier {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    async fn write_chain(&self, chain: &ChainOfTrust) -> Result<PathBuf, ExecError> {
        let path = chain.work_dir.join(CHAIN_FILE);
        let body = serde_json::to_vec_pretty(chain).map_err(|e| ExecError::Io(e.to_string()))?;
        tokio::fs::create_dir_all(&chain.work_dir).await?;
        tokio::fs::write(&path, body).await?;
        Ok(path)
    }
}

#[async_trait]
impl TrustVerifier for CommandVerifier {
    async fn verify(&self, chain: &ChainOfTrust) -> Result<(), CoreError> {
        let path = self.write_chain(chain).await?;

        let mut cmd = cmd_argv(&self.argv)?;
        cmd.arg(&path)
            .current_dir(&chain.work_dir)
            .stdin(Stdio::null())
            // Dropped when the orchestrator abandons verification on shutdown.
            .kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .map_err(|e| ExecError::Spawn(e.to_string()))?;
        if output.status.success() {
            debug!(target: "tack.exec.verify", task = %chain.task.task_id, "chain of trust verified");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match stderr.trim() {
            "" => format!("chain of trust verification failed ({})", output.status),
            msg => format!("chain of trust verification failed: {msg}"),
        };
        warn!(target: "tack.exec.verify", task = %chain.task.task_id, %reason);
        Err(WorkerError::new(ExitStatus::MalformedPayload, reason).into())
    }
}
