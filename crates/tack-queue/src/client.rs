use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tack_core::{ClaimQueue, CoreError, WorkerConfig};
use tack_model::{ClaimedTask, Credentials, ExitStatus, Lease, Resolution, WorkClaim};
use tracing::{debug, info, trace};

use crate::{config::QueueConfig, errors::QueueError, routes::Routes};

/// Body of a claim request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimRequest<'a> {
    worker_group: &'a str,
    worker_id: &'a str,
    tasks: u32,
}

/// Body of an exception resolution.
#[derive(Debug, Serialize)]
struct ExceptionReport<'a> {
    reason: &'a str,
}

/// [`ClaimQueue`] speaking JSON over HTTP.
pub struct HttpQueue {
    http: reqwest::Client,
    routes: Routes,
    provisioner_id: String,
    worker_type: String,
    worker_group: String,
    worker_id: String,
    credentials: Credentials,
}

impl HttpQueue {
    pub fn new(cfg: &QueueConfig, worker: &WorkerConfig) -> Result<Self, QueueError> {
        Ok(Self {
            http: cfg.http_client()?,
            routes: Routes::new(&cfg.root_url),
            provisioner_id: worker.provisioner_id.clone(),
            worker_type: worker.worker_type.clone(),
            worker_group: worker.worker_group.clone(),
            worker_id: worker.worker_id.clone(),
            credentials: worker.credentials.clone(),
        })
    }

    async fn claim(&self) -> Result<WorkClaim, QueueError> {
        let url = self.routes.claim_work(&self.provisioner_id, &self.worker_type);
        let body = ClaimRequest {
            worker_group: &self.worker_group,
            worker_id: &self.worker_id,
            tasks: 1,
        };
        trace!(target: "tack.queue", %url, "claim work");

        let resp = self.send(self.http.post(&url).json(&body)).await?;
        let resp = ensure_success(resp, &url).await?;
        resp.json::<WorkClaim>()
            .await
            .map_err(|e| QueueError::InvalidResponse(format!("claim-work: {e}")))
    }

    async fn reclaim(&self, task: &ClaimedTask) -> Result<Lease, QueueError> {
        let url = self.routes.reclaim(task);
        trace!(target: "tack.queue", %url, "reclaim");

        let resp = self.send(self.http.post(&url)).await?;
        if resp.status() == StatusCode::CONFLICT {
            return Err(QueueError::Conflict(format!(
                "{}/{}",
                task.task_id, task.run_id
            )));
        }
        let resp = ensure_success(resp, &url).await?;
        resp.json::<Lease>()
            .await
            .map_err(|e| QueueError::InvalidResponse(format!("reclaim: {e}")))
    }

    async fn resolve(&self, task: &ClaimedTask, status: ExitStatus) -> Result<(), QueueError> {
        let resolution = Resolution::from(status);
        let url = self.routes.resolve(task, resolution);
        let req = match resolution.reason() {
            Some(reason) => self.http.post(&url).json(&ExceptionReport { reason }),
            None => self.http.post(&url),
        };
        debug!(target: "tack.queue", %url, %status, "resolving run");

        let resp = self.send(req).await?;
        if resp.status() == StatusCode::CONFLICT {
            info!(
                target: "tack.queue",
                task = %task.task_id,
                run = task.run_id,
                "run already resolved upstream"
            );
            return Ok(());
        }
        ensure_success(resp, &url).await?;
        Ok(())
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, QueueError> {
        Ok(authorize(req, &self.credentials).send().await?)
    }
}

#[async_trait]
impl ClaimQueue for HttpQueue {
    async fn claim_work(&self) -> Result<WorkClaim, CoreError> {
        Ok(self.claim().await?)
    }

    async fn renew(&self, task: &ClaimedTask) -> Result<Lease, CoreError> {
        Ok(self.reclaim(task).await?)
    }

    async fn complete(&self, task: &ClaimedTask, status: ExitStatus) -> Result<(), CoreError> {
        Ok(self.resolve(task, status).await?)
    }
}

pub(crate) fn authorize(req: RequestBuilder, creds: &Credentials) -> RequestBuilder {
    if creds.is_empty() {
        return req;
    }
    req.header("x-tack-client-id", &creds.client_id)
        .bearer_auth(&creds.access_token)
}

pub(crate) async fn ensure_success(resp: Response, url: &str) -> Result<Response, QueueError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(QueueError::Status {
        status: status.as_u16(),
        url: url.to_string(),
        body,
    })
}
