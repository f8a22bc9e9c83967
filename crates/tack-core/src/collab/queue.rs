use async_trait::async_trait;
use tack_model::{ClaimedTask, ExitStatus, Lease, WorkClaim};

use crate::error::CoreError;

/// Remote work-distribution queue.
#[async_trait]
pub trait ClaimQueue: Send + Sync + 'static {
    /// Ask for work. May return zero or more tasks.
    ///
    /// Not guaranteed to be safely interruptible: a claim can succeed on the
    /// queue side even when the caller stopped waiting for it.
    async fn claim_work(&self) -> Result<WorkClaim, CoreError>;

    /// Extend the lease of a claimed run. Idempotent.
    ///
    /// Returns [`CoreError::LeaseLost`] when the run is no longer ours.
    async fn renew(&self, task: &ClaimedTask) -> Result<Lease, CoreError>;

    /// Report the final status of a run. Called exactly once per executed task.
    async fn complete(&self, task: &ClaimedTask, status: ExitStatus) -> Result<(), CoreError>;
}
