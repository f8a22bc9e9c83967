use std::sync::Arc;

use tack_model::ClaimedTask;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::{
    context::Context,
    error::CoreError,
    event::{Event, EventKind},
};

/// Background lease renewal bound to one claimed task.
///
/// Started right after the claim, stopped once the run is resolved.
/// Dropping it without [`LeaseRenewal::stop`] still cancels the background task.
pub struct LeaseRenewal {
    ctx: Arc<Context>,
    task: ClaimedTask,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl LeaseRenewal {
    pub fn start(ctx: Arc<Context>, task: ClaimedTask) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(renew_loop(
            Arc::clone(&ctx),
            task.clone(),
            cancel.clone(),
        ));
        ctx.publish(Event::new(EventKind::LeaseStarted).with_task(&task.task_id));

        Self {
            ctx,
            task,
            cancel,
            handle: Some(handle),
        }
    }

    /// Cancel the renewal and wait until the background task is gone.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    warn!(task = %self.task.task_id, "lease renewal panicked");
                }
            }
        }
        self.ctx
            .publish(Event::new(EventKind::LeaseStopped).with_task(&self.task.task_id));
    }
}

impl Drop for LeaseRenewal {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            warn!(task = %self.task.task_id, "lease renewal dropped without stop; aborting");
            self.cancel.cancel();
            handle.abort();
        }
    }
}

async fn renew_loop(ctx: Arc<Context>, mut task: ClaimedTask, cancel: CancellationToken) {
    let interval = ctx.config().reclaim_interval();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }

        let renewed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            res = ctx.queue().renew(&task) => res,
        };

        match renewed {
            Ok(lease) => {
                trace!(task = %task.task_id, taken_until = ?lease.taken_until, "lease renewed");
                ctx.update_lease(&task.task_id, lease.clone());
                task.renew(lease);
                ctx.publish(Event::new(EventKind::LeaseRenewed).with_task(&task.task_id));
            }
            Err(CoreError::LeaseLost(reason)) => {
                ctx.publish(
                    Event::new(EventKind::LeaseLost)
                        .with_task(&task.task_id)
                        .with_reason(reason),
                );
                return;
            }
            Err(e) => {
                ctx.publish(
                    Event::new(EventKind::LeaseRenewFailed)
                        .with_task(&task.task_id)
                        .with_reason(e.to_string()),
                );
            }
        }
    }
}
