//! Lifecycle events published by the orchestrator.
//!
//! Rendering is left to subscribers (`tack-observe` turns them into log lines).

use std::sync::Arc;

use tack_model::{ExitStatus, TaskId};

use crate::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // claim
    ClaimFailed,
    NoWork,
    TaskClaimed,

    // lease
    LeaseStarted,
    LeaseRenewed,
    LeaseRenewFailed,
    LeaseLost,
    LeaseStopped,

    // execution
    VerificationSkipped,
    ProcessAdopted,
    StageFailed,
    TaskResolved,
    CleanupFailed,

    // shutdown
    ShutdownRequested,
    IterationCancelled,

    // terminal
    UnexpectedFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub task: Option<TaskId>,
    pub stage: Option<Stage>,
    pub status: Option<ExitStatus>,
    pub reason: Option<String>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            task: None,
            stage: None,
            status: None,
            reason: None,
        }
    }

    pub fn with_task(mut self, task: &TaskId) -> Self {
        self.task = Some(task.clone());
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_status(mut self, status: ExitStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Receives every lifecycle event, synchronously, on the publishing task.
pub trait Subscribe: Send + Sync + 'static {
    fn on_event(&self, event: &Event);

    fn name(&self) -> &'static str;
}

/// Fan-out to the registered subscribers.
#[derive(Clone, Default)]
pub struct Bus {
    subscribers: Arc<[Arc<dyn Subscribe>]>,
}

impl Bus {
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self {
            subscribers: subscribers.into(),
        }
    }

    pub fn publish(&self, event: Event) {
        for s in self.subscribers.iter() {
            s.on_event(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
