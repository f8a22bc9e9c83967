use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tack_core::{ArtifactPublisher, CoreError, WorkerConfig, fs::collect_files};
use tack_model::{ClaimedTask, Credentials};
use tracing::debug;

use crate::{
    client::{authorize, ensure_success},
    config::QueueConfig,
    errors::QueueError,
    routes::Routes,
};

/// Uploads every regular file under the artifact directory.
pub struct HttpPublisher {
    http: reqwest::Client,
    routes: Routes,
    artifact_dir: PathBuf,
    credentials: Credentials,
}

impl HttpPublisher {
    pub fn new(cfg: &QueueConfig, worker: &WorkerConfig) -> Result<Self, QueueError> {
        Ok(Self {
            http: cfg.http_client()?,
            routes: Routes::new(&cfg.root_url),
            artifact_dir: worker.artifact_dir.clone(),
            credentials: worker.credentials.clone(),
        })
    }

    async fn put(&self, task: &ClaimedTask, relative: &str, path: &Path) -> Result<(), QueueError> {
        let body = tokio::fs::read(path).await.map_err(|e| QueueError::Artifact {
            path: relative.to_string(),
            reason: e.to_string(),
        })?;
        let url = self.routes.artifact(task, relative);
        // Task-scoped credentials from the latest renewal win over the worker's own.
        let creds = task.lease.credentials.as_ref().unwrap_or(&self.credentials);

        debug!(target: "tack.queue.publish", %url, bytes = body.len(), "uploading artifact");
        let resp = authorize(self.http.put(&url), creds).body(body).send().await?;
        ensure_success(resp, &url).await?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactPublisher for HttpPublisher {
    async fn upload(&self, task: &ClaimedTask) -> Result<(), CoreError> {
        let files = collect_files(&self.artifact_dir).map_err(|e| QueueError::Artifact {
            path: self.artifact_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        for (relative, path) in files {
            self.put(task, &relative, &path).await?;
        }
        Ok(())
    }
}
