use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::QueueError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Base URL of the queue service, without a trailing slash.
    pub root_url: String,
    /// Idle connections kept per host.
    pub max_connections: usize,
    pub request_timeout_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            root_url: "http://127.0.0.1:8080".to_string(),
            max_connections: 8,
            request_timeout_ms: 30_000,
        }
    }
}

impl QueueConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), QueueError> {
        let url = self.root_url.trim();
        if url.is_empty() {
            return Err(QueueError::Config("queue.root_url must not be empty".into()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(QueueError::Config(format!(
                "queue.root_url must be an http(s) url, got {url:?}"
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(QueueError::Config("queue.request_timeout_ms must be > 0".into()));
        }
        Ok(())
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client, QueueError> {
        self.validate()?;
        reqwest::Client::builder()
            .pool_max_idle_per_host(self.max_connections)
            .timeout(self.request_timeout())
            .build()
            .map_err(QueueError::from)
    }
}
