use std::sync::{Arc, Mutex};

use tack_model::{ClaimedTask, Credentials, Lease, TaskId};
use tracing::debug;

use crate::{
    cancel::{CancelToken, WeakCancelToken},
    collab::{ArtifactPublisher, ClaimQueue, Collaborators, TaskExecutor, TrustVerifier},
    config::WorkerConfig,
    event::{Bus, Event, Subscribe},
    sync::lock,
};

/// Process-wide state: exactly one per worker process.
///
/// Configuration and collaborators are read-only after construction.
/// The claimed task and the running iteration are written only by the orchestrator
/// and read by the shutdown path.
pub struct Context {
    config: Arc<WorkerConfig>,
    collab: Collaborators,
    bus: Bus,
    task: Mutex<Option<ClaimedTask>>,
    running: Mutex<Option<WeakCancelToken>>,
}

impl Context {
    pub fn new(config: WorkerConfig, collab: Collaborators) -> Self {
        Self {
            config: Arc::new(config),
            collab,
            bus: Bus::default(),
            task: Mutex::new(None),
            running: Mutex::new(None),
        }
    }

    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.bus = Bus::new(subscribers);
        self
    }

    #[inline]
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    #[inline]
    pub fn queue(&self) -> &Arc<dyn ClaimQueue> {
        &self.collab.queue
    }

    #[inline]
    pub fn verifier(&self) -> Option<&Arc<dyn TrustVerifier>> {
        self.collab.verifier.as_ref()
    }

    #[inline]
    pub fn executor(&self) -> &Arc<dyn TaskExecutor> {
        &self.collab.executor
    }

    #[inline]
    pub fn publisher(&self) -> &Arc<dyn ArtifactPublisher> {
        &self.collab.publisher
    }

    #[inline]
    pub fn publish(&self, event: Event) {
        self.bus.publish(event);
    }

    /// Snapshot of the currently claimed task, with the latest renewed lease.
    pub fn task(&self) -> Option<ClaimedTask> {
        lock(&self.task).clone()
    }

    /// Credentials for talking to the queue on behalf of the current task.
    ///
    /// Temporary task credentials win over the worker's own.
    pub fn credentials(&self) -> Credentials {
        lock(&self.task)
            .as_ref()
            .and_then(|t| t.lease.credentials.clone())
            .unwrap_or_else(|| self.config.credentials.clone())
    }

    pub(crate) fn set_task(&self, task: Option<ClaimedTask>) {
        *lock(&self.task) = task;
    }

    /// Apply a renewed lease if `task_id` is still the claimed task.
    pub(crate) fn update_lease(&self, task_id: &TaskId, lease: Lease) {
        if let Some(task) = lock(&self.task).as_mut()
            && &task.task_id == task_id
        {
            task.renew(lease);
        }
    }

    /// Make `token` reachable from the shutdown path until the returned guard drops.
    pub fn register_running(&self, token: &CancelToken) -> Registration<'_> {
        *lock(&self.running) = Some(token.downgrade());
        Registration { ctx: self }
    }

    pub fn has_running(&self) -> bool {
        lock(&self.running)
            .as_ref()
            .and_then(WeakCancelToken::upgrade)
            .is_some()
    }

    /// Cancel the registered iteration, if any. Returns whether one was found.
    pub fn cancel_running(&self) -> bool {
        let token = lock(&self.running).as_ref().and_then(WeakCancelToken::upgrade);
        match token {
            Some(token) => {
                token.cancel();
                true
            }
            None => {
                debug!("no iteration in flight");
                false
            }
        }
    }
}

/// Clears the context's running registration on every exit path.
pub struct Registration<'a> {
    ctx: &'a Context,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        *lock(&self.ctx.running) = None;
    }
}
