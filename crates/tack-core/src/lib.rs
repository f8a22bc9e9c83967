//! Task lifecycle core of the tack worker.
//!
//! One [`Worker`] repeatedly drives an [`Orchestrator`] iteration:
//! claim → lease renewal → trust verification → execution → chain-of-trust generation →
//! artifact upload → resolution → cleanup.
//! Every suspension point of an iteration is reachable by a single [`CancelToken`],
//! which is what the shutdown path uses to interrupt whatever is in flight.

pub mod error;
pub use error::{ConfigError, CoreError, WorkerError};

pub mod config;
pub use config::WorkerConfig;

pub mod collab;
pub use collab::{
    ArtifactPublisher, ChainOfTrust, ClaimQueue, Collaborators, TaskExecutor, TaskProcess,
    TrustVerifier,
};

pub mod event;
pub use event::{Bus, Event, EventKind, Subscribe};

mod stage;
pub use stage::Stage;

mod context;
pub use context::{Context, Registration};

pub mod cancel;
pub use cancel::{CancelToken, Cancellable, WeakCancelToken};

mod lease;
pub use lease::LeaseRenewal;

mod orchestrator;
pub use orchestrator::{Orchestrator, Outcome};

mod worker;
pub use worker::{ShutdownHandle, Worker};

pub mod fs;

pub mod cot;

mod system;
pub use system::{default_worker_id, platform};

mod sync;

pub mod prelude {
    pub use crate::{
        ArtifactPublisher, ClaimQueue, Context, CoreError, TaskExecutor, TaskProcess,
        TrustVerifier, Worker, WorkerConfig, WorkerError,
    };
    pub use tack_model::{ClaimedTask, ExitStatus, WorkClaim};
}
