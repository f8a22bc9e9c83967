use std::borrow::Borrow;

use tack_core::{Event, EventKind};
use tracing::{debug, error, info, trace, warn};

pub trait View {
    fn as_task(&self) -> &str;
    fn as_reason(&self) -> &str;
    fn as_stage(&self) -> &str;
    fn as_status(&self) -> &str;
    fn code(&self) -> i32;
    fn kind(&self) -> EventKind;
}

impl<T> View for T
where
    T: Borrow<Event>,
{
    #[inline]
    fn as_task(&self) -> &str {
        self.borrow().task.as_ref().map_or("none", |t| t.as_str())
    }
    #[inline]
    fn as_reason(&self) -> &str {
        self.borrow().reason.as_deref().unwrap_or("unknown")
    }
    #[inline]
    fn as_stage(&self) -> &str {
        self.borrow().stage.map_or("none", |s| s.as_str())
    }
    #[inline]
    fn as_status(&self) -> &str {
        self.borrow().status.map_or("none", |s| s.as_str())
    }
    #[inline]
    fn code(&self) -> i32 {
        self.borrow().status.map_or(-1, |s| s.code())
    }
    #[inline]
    fn kind(&self) -> EventKind {
        self.borrow().kind
    }
}

#[inline]
pub fn message_for(kind: EventKind) -> &'static str {
    match kind {
        // claim
        EventKind::ClaimFailed => "claim failed; treating as no work",
        EventKind::NoWork => "no work available",
        EventKind::TaskClaimed => "task claimed",

        // lease
        EventKind::LeaseStarted => "lease renewal started",
        EventKind::LeaseRenewed => "lease renewed",
        EventKind::LeaseRenewFailed => "lease renewal failed; will retry",
        EventKind::LeaseLost => "lease lost; run is no longer ours",
        EventKind::LeaseStopped => "lease renewal stopped",

        // execution
        EventKind::VerificationSkipped => "chain of trust verification disabled",
        EventKind::ProcessAdopted => "task process running",
        EventKind::StageFailed => "stage failed",
        EventKind::TaskResolved => "task resolved",
        EventKind::CleanupFailed => "failed to clean up work directories",

        // shutdown
        EventKind::ShutdownRequested => "shutdown requested",
        EventKind::IterationCancelled => "iteration cancelled before a task was claimed",

        // terminal
        EventKind::UnexpectedFailure => "unexpected failure; worker stopping",
    }
}

#[inline]
pub fn log_event<E: View>(e: E) {
    let msg = message_for(e.kind());

    match e.kind() {
        // claim
        EventKind::ClaimFailed => warn!(reason = e.as_reason(), "{msg}"),
        EventKind::NoWork => trace!("{msg}"),
        EventKind::TaskClaimed => info!(task = e.as_task(), "{msg}"),

        // lease
        EventKind::LeaseStarted | EventKind::LeaseStopped => trace!(task = e.as_task(), "{msg}"),
        EventKind::LeaseRenewed => debug!(task = e.as_task(), "{msg}"),
        EventKind::LeaseRenewFailed => {
            debug!(task = e.as_task(), reason = e.as_reason(), "{msg}")
        }
        EventKind::LeaseLost => warn!(task = e.as_task(), reason = e.as_reason(), "{msg}"),

        // execution
        EventKind::VerificationSkipped => debug!(task = e.as_task(), "{msg}"),
        EventKind::ProcessAdopted => debug!(task = e.as_task(), reason = e.as_reason(), "{msg}"),
        EventKind::StageFailed => error!(
            task = e.as_task(),
            stage = e.as_stage(),
            status = e.as_status(),
            reason = e.as_reason(),
            "{msg}"
        ),
        EventKind::TaskResolved => info!(
            task = e.as_task(),
            status = e.as_status(),
            code = e.code(),
            "{msg}"
        ),
        EventKind::CleanupFailed => warn!(reason = e.as_reason(), "{msg}"),

        // shutdown
        EventKind::ShutdownRequested => info!("{msg}"),
        EventKind::IterationCancelled => debug!("{msg}"),

        // terminal
        EventKind::UnexpectedFailure => error!(
            task = e.as_task(),
            stage = e.as_stage(),
            reason = e.as_reason(),
            "{msg}"
        ),
    }
}
