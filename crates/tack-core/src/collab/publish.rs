use async_trait::async_trait;
use tack_model::ClaimedTask;

use crate::error::CoreError;

/// Publishes whatever the task left in the artifact directory.
#[async_trait]
pub trait ArtifactPublisher: Send + Sync + 'static {
    /// [`CoreError::Transport`] on network failures; the orchestrator ranks those as intermittent.
    async fn upload(&self, task: &ClaimedTask) -> Result<(), CoreError>;
}
