//! The worker's TOML file and its validation.

use std::path::Path;

use serde::Deserialize;
use tack_core::{ConfigError, WorkerConfig};
use tack_exec::ExecConfig;
use tack_model::Credentials;
use tack_observe::LoggerConfig;
use tack_queue::QueueConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CotConfig {
    /// argv of the verifier; the chain description path is appended.
    pub verifier: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub worker: WorkerConfig,
    pub log: LoggerConfig,
    pub queue: QueueConfig,
    pub exec: ExecConfig,
    pub cot: CotConfig,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&raw).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Replace the worker credentials with a `{clientId, accessToken}` JSON file.
    pub fn load_credentials(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = std::fs::read(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let creds: Credentials = serde_json::from_slice(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.worker.credentials = creds;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.worker.validate()?;
        self.queue
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.exec.task_script.is_empty() {
            return Err(ConfigError::Invalid("exec.task_script must be set".into()));
        }
        if self.worker.verify_chain_of_trust && self.cot.verifier.is_empty() {
            return Err(ConfigError::Invalid(
                "cot.verifier is required when worker.verify_chain_of_trust is set".into(),
            ));
        }
        Ok(())
    }
}
