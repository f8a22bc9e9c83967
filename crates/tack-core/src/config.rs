//! Worker identity, timing and filesystem layout.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use tack_model::Credentials;

use crate::{error::ConfigError, system::default_worker_id};

/// Settings read once at startup and shared read-only for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub provisioner_id: String,
    pub worker_type: String,
    pub worker_group: String,
    pub worker_id: String,

    /// Sleep between claim attempts when the queue has nothing for us.
    pub poll_interval_ms: u64,
    /// Period of lease renewal while a task runs; must stay below the queue's lease length.
    pub reclaim_interval_ms: u64,

    pub verify_chain_of_trust: bool,
    pub cot_job_type: String,
    /// Write `public/chain-of-trust.json` into the artifact directory after the task exits.
    pub generate_chain_of_trust: bool,

    pub work_dir: PathBuf,
    pub artifact_dir: PathBuf,
    pub task_log_dir: PathBuf,

    pub credentials: Credentials,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            provisioner_id: "tack".to_string(),
            worker_type: "tack-worker".to_string(),
            worker_group: "tack".to_string(),
            worker_id: default_worker_id().to_string(),
            poll_interval_ms: 10_000,
            reclaim_interval_ms: 300_000,
            verify_chain_of_trust: false,
            cot_job_type: "signing".to_string(),
            generate_chain_of_trust: true,
            work_dir: PathBuf::from("/var/lib/tack/work"),
            artifact_dir: PathBuf::from("/var/lib/tack/artifacts"),
            task_log_dir: PathBuf::from("/var/lib/tack/logs"),
            credentials: Credentials::default(),
        }
    }
}

impl WorkerConfig {
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[inline]
    pub fn reclaim_interval(&self) -> Duration {
        Duration::from_millis(self.reclaim_interval_ms)
    }

    /// Every directory the worker owns and wipes between tasks.
    pub fn managed_dirs(&self) -> [&PathBuf; 3] {
        [&self.work_dir, &self.artifact_dir, &self.task_log_dir]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ids = [
            ("provisioner_id", &self.provisioner_id),
            ("worker_type", &self.worker_type),
            ("worker_group", &self.worker_group),
            ("worker_id", &self.worker_id),
        ];
        for (name, value) in ids {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0".into()));
        }
        if self.reclaim_interval_ms == 0 {
            return Err(ConfigError::Invalid("reclaim_interval_ms must be > 0".into()));
        }
        if self.verify_chain_of_trust && self.cot_job_type.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "cot_job_type is required when verify_chain_of_trust is set".into(),
            ));
        }
        let dirs = self.managed_dirs();
        for (i, a) in dirs.iter().enumerate() {
            if a.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("managed directories must be set".into()));
            }
            if dirs[i + 1..].contains(a) {
                return Err(ConfigError::Invalid(format!(
                    "{} is used for more than one managed directory",
                    a.display()
                )));
            }
        }
        Ok(())
    }
}
