use serde::{Deserialize, Serialize};

use crate::{Credentials, RunId, TaskId};

/// Time-bounded ownership grant over one task run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    /// RFC3339 deadline after which the queue may hand the run to someone else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken_until: Option<String>,
    /// Temporary credentials scoped to this run, refreshed on every renewal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

/// One task handed to this worker by a claim call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimedTask {
    pub task_id: TaskId,
    #[serde(default)]
    pub run_id: RunId,
    /// Task definition; opaque to the worker, handed verbatim to the task script.
    #[serde(default)]
    pub definition: serde_json::Value,
    #[serde(flatten)]
    pub lease: Lease,
}

impl ClaimedTask {
    pub fn new(task_id: impl Into<TaskId>, run_id: RunId, definition: serde_json::Value) -> Self {
        Self {
            task_id: task_id.into(),
            run_id,
            definition,
            lease: Lease {
                taken_until: None,
                credentials: None,
            },
        }
    }

    /// Apply a renewed lease.
    pub fn renew(&mut self, lease: Lease) {
        if lease.taken_until.is_some() {
            self.lease.taken_until = lease.taken_until;
        }
        if lease.credentials.is_some() {
            self.lease.credentials = lease.credentials;
        }
    }
}

/// Result of one claim call: zero or more tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkClaim {
    #[serde(default)]
    pub tasks: Vec<ClaimedTask>,
}

impl WorkClaim {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(task: ClaimedTask) -> Self {
        Self { tasks: vec![task] }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
