//! The worker's own chain-of-trust artifact.
//!
//! Written after the task process exits, into the artifact directory, so the publisher
//! uploads it with everything else. Downstream verifiers use it to check which worker ran
//! the task and what it produced.

use std::{collections::BTreeMap, fs, path::PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tack_model::{ClaimedTask, ExitStatus, RunId, TaskId};

use crate::{
    config::WorkerConfig,
    error::{CoreError, WorkerError},
    fs::collect_files,
    system::platform,
};

/// Relative to the artifact directory.
pub const COT_FILE: &str = "public/chain-of-trust.json";
pub const COT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDigest {
    pub sha256: String,
}

/// Serialized form of the chain-of-trust artifact.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainOfTrustArtifact {
    pub chain_of_trust_version: u32,
    pub task_id: TaskId,
    pub run_id: RunId,
    pub provisioner_id: String,
    pub worker_type: String,
    pub worker_group: String,
    pub worker_id: String,
    pub environment: &'static str,
    pub task: serde_json::Value,
    pub artifacts: BTreeMap<String, ArtifactDigest>,
}

impl ChainOfTrustArtifact {
    /// Describe `task` and hash every artifact it left behind.
    pub fn collect(cfg: &WorkerConfig, task: &ClaimedTask) -> std::io::Result<Self> {
        let mut artifacts = BTreeMap::new();
        for (relative, path) in collect_files(&cfg.artifact_dir)? {
            if relative == COT_FILE {
                continue;
            }
            let digest = Sha256::digest(fs::read(&path)?);
            artifacts.insert(
                relative,
                ArtifactDigest {
                    sha256: hex::encode(digest),
                },
            );
        }

        Ok(Self {
            chain_of_trust_version: COT_VERSION,
            task_id: task.task_id.clone(),
            run_id: task.run_id,
            provisioner_id: cfg.provisioner_id.clone(),
            worker_type: cfg.worker_type.clone(),
            worker_group: cfg.worker_group.clone(),
            worker_id: cfg.worker_id.clone(),
            environment: platform(),
            task: task.definition.clone(),
            artifacts,
        })
    }
}

/// Write the chain-of-trust artifact for `task`.
///
/// Any failure is a structured worker failure with the internal-error tier.
pub fn generate(cfg: &WorkerConfig, task: &ClaimedTask) -> Result<PathBuf, CoreError> {
    let failed = |reason: String| {
        WorkerError::new(
            ExitStatus::InternalError,
            format!("chain of trust generation failed: {reason}"),
        )
    };

    let artifact = ChainOfTrustArtifact::collect(cfg, task).map_err(|e| failed(e.to_string()))?;
    let body = serde_json::to_vec_pretty(&artifact).map_err(|e| failed(e.to_string()))?;

    let path = cfg.artifact_dir.join(COT_FILE);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
    }
    fs::write(&path, body).map_err(|e| failed(format!("{}: {e}", path.display())))?;
    Ok(path)
}
