//! Contracts the orchestrator requires from the outside world.
//!
//! Implementations live in other crates (`tack-queue`, `tack-exec`) or in tests.

mod queue;
pub use queue::ClaimQueue;

mod trust;
pub use trust::{ChainOfTrust, TrustVerifier};

mod exec;
pub use exec::{TaskExecutor, TaskProcess};

mod publish;
pub use publish::ArtifactPublisher;

use std::sync::Arc;

/// Every collaborator one worker process talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub queue: Arc<dyn ClaimQueue>,
    /// Required only when chain-of-trust verification is enabled.
    pub verifier: Option<Arc<dyn TrustVerifier>>,
    pub executor: Arc<dyn TaskExecutor>,
    pub publisher: Arc<dyn ArtifactPublisher>,
}
