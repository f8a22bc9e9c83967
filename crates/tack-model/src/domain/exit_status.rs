use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity tier of a task outcome.
///
/// Tiers form a total order by their numeric code, `Success` being the unique minimum.
/// Combining two outcomes always keeps the more severe one, see [`ExitStatus::worst`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[repr(i32)]
pub enum ExitStatus {
    /// Task ran to completion.
    #[default]
    Success = 0,
    /// Task logic failed.
    Failure = 1,
    /// The worker was asked to shut down while the task was in flight.
    WorkerShutdown = 2,
    /// The task definition could not be trusted or understood.
    MalformedPayload = 3,
    /// Something the task needs was unavailable.
    ResourceUnavailable = 4,
    /// The worker hit an internal error while handling the task.
    InternalError = 5,
    /// A newer task made this one obsolete.
    Superseded = 6,
    /// Transient failure; the task is worth retrying.
    IntermittentTask = 7,
}

/// Returned when an integer does not name a known tier.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown exit status code: {0}")]
pub struct UnknownStatus(pub i32);

impl ExitStatus {
    pub const ALL: [ExitStatus; 8] = [
        ExitStatus::Success,
        ExitStatus::Failure,
        ExitStatus::WorkerShutdown,
        ExitStatus::MalformedPayload,
        ExitStatus::ResourceUnavailable,
        ExitStatus::InternalError,
        ExitStatus::Superseded,
        ExitStatus::IntermittentTask,
    ];

    /// Numeric code as reported by task processes.
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Strict lookup of a known code.
    pub fn from_code(code: i32) -> Result<Self, UnknownStatus> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.code() == code)
            .ok_or(UnknownStatus(code))
    }

    /// Lenient mapping for process exit codes: unknown non-zero codes are plain failures.
    pub fn from_exit_code(code: i32) -> Self {
        Self::from_code(code).unwrap_or(ExitStatus::Failure)
    }

    /// The more severe of the two.
    #[inline]
    pub fn worst(self, other: ExitStatus) -> ExitStatus {
        self.max(other)
    }

    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    /// Kebab-case name, also used as the exception reason reported to the queue.
    pub fn as_str(self) -> &'static str {
        match self {
            ExitStatus::Success => "success",
            ExitStatus::Failure => "failure",
            ExitStatus::WorkerShutdown => "worker-shutdown",
            ExitStatus::MalformedPayload => "malformed-payload",
            ExitStatus::ResourceUnavailable => "resource-unavailable",
            ExitStatus::InternalError => "internal-error",
            ExitStatus::Superseded => "superseded",
            ExitStatus::IntermittentTask => "intermittent-task",
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.as_str(), self.code())
    }
}

/// Combine any number of outcomes into the most severe one.
///
/// An empty input is `Success`, the identity of the combination.
pub fn worst_level<I>(statuses: I) -> ExitStatus
where
    I: IntoIterator<Item = ExitStatus>,
{
    statuses
        .into_iter()
        .fold(ExitStatus::Success, ExitStatus::worst)
}
