use std::sync::Arc;

use async_trait::async_trait;
use tack_model::{ClaimedTask, ExitStatus};

use crate::error::CoreError;

/// Live handle to a running task process.
#[async_trait]
pub trait TaskProcess: Send + Sync + 'static {
    fn pid(&self) -> Option<u32>;

    /// Ask the process to exit because the worker is shutting down.
    ///
    /// Must not block: it only delivers the request (a termination signal, never a forced kill).
    /// A process stopped this way reports [`ExitStatus::WorkerShutdown`] from [`TaskProcess::wait`].
    fn stop_for_shutdown(&self);

    /// Wait for the process to exit and map its exit to a severity tier.
    async fn wait(&self) -> Result<ExitStatus, CoreError>;
}

/// Starts the process for one claimed task.
#[async_trait]
pub trait TaskExecutor: Send + Sync + 'static {
    async fn spawn(&self, task: &ClaimedTask) -> Result<Arc<dyn TaskProcess>, CoreError>;
}
