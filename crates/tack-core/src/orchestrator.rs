use std::sync::{Arc, Mutex};

use tack_model::{ClaimedTask, ExitStatus, WorkClaim};
use tracing::{debug, error, info, instrument, trace};

use crate::{
    cancel::CancelToken,
    collab::ChainOfTrust,
    context::Context,
    cot,
    error::CoreError,
    event::{Event, EventKind},
    fs,
    lease::LeaseRenewal,
    stage::Stage,
    sync::lock,
};

/// What one iteration produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was claimed; the iteration slept the poll interval.
    Idle,
    /// Interrupted by a shutdown request before any task was claimed.
    Cancelled,
    /// Status of the last task run in this iteration.
    Finished(ExitStatus),
}

impl Outcome {
    /// The reported status, `None` when no task ran.
    pub fn status(&self) -> Option<ExitStatus> {
        match self {
            Outcome::Finished(s) => Some(*s),
            Outcome::Idle | Outcome::Cancelled => None,
        }
    }
}

/// Drives one polling iteration: claim, verify, execute, upload, complete, cleanup.
///
/// Owns the [`CancelToken`] of that iteration. Errors returned from
/// [`Orchestrator::invoke`] are unrecognized faults and meant to be fatal;
/// every recognized failure is folded into the reported [`ExitStatus`].
pub struct Orchestrator {
    token: CancelToken,
    stage: Mutex<Stage>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            token: CancelToken::new(),
            stage: Mutex::new(Stage::Idle),
        }
    }

    #[inline]
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn stage(&self) -> Stage {
        *lock(&self.stage)
    }

    #[instrument(level = "debug", skip_all)]
    pub async fn invoke(&self, ctx: &Arc<Context>) -> Result<Outcome, CoreError> {
        self.enter(Stage::Claiming);
        let claim = match self.token.run_cancellable(ctx.queue().claim_work()).await {
            Ok(claim) => claim,
            Err(CoreError::Cancelled) => return Ok(self.cancelled(ctx)),
            Err(CoreError::Transport(reason)) => {
                ctx.publish(Event::new(EventKind::ClaimFailed).with_reason(reason));
                WorkClaim::empty()
            }
            Err(e) => return Err(self.unexpected(ctx, None, e)),
        };

        if claim.is_empty() {
            ctx.publish(Event::new(EventKind::NoWork));
            self.enter(Stage::Idle);
            let poll = ctx.config().poll_interval();
            let slept = self
                .token
                .run_cancellable(async {
                    tokio::time::sleep(poll).await;
                    Ok(())
                })
                .await;
            return match slept {
                Ok(()) => Ok(Outcome::Idle),
                Err(_) => Ok(self.cancelled(ctx)),
            };
        }

        // The queue is expected to hand out one task per claim. Should more arrive they
        // run back to back, and the iteration reports the status of the last one.
        let mut last = None;
        for task in claim.tasks {
            last = Some(self.run_claimed(ctx, task).await?);
        }
        self.enter(Stage::Idle);
        Ok(last.map_or(Outcome::Idle, Outcome::Finished))
    }

    async fn run_claimed(&self, ctx: &Arc<Context>, task: ClaimedTask) -> Result<ExitStatus, CoreError> {
        self.enter(Stage::Preparing);
        info!(task = %task.task_id, run = task.run_id, "task claimed");
        ctx.publish(Event::new(EventKind::TaskClaimed).with_task(&task.task_id));
        ctx.set_task(Some(task.clone()));

        let result = match fs::write_task_definition(ctx.config(), &task) {
            Ok(_) => {
                let lease = LeaseRenewal::start(Arc::clone(ctx), task.clone());
                let result = self.run_stages(ctx, &task).await;
                lease.stop().await;
                result
            }
            Err(e) => Err(self.unexpected(ctx, Some(&task), e)),
        };

        self.enter(Stage::Cleanup);
        ctx.set_task(None);
        if let Err(e) = fs::cleanup(ctx.config()) {
            ctx.publish(
                Event::new(EventKind::CleanupFailed)
                    .with_task(&task.task_id)
                    .with_reason(e.to_string()),
            );
        }
        result
    }

    async fn run_stages(&self, ctx: &Arc<Context>, task: &ClaimedTask) -> Result<ExitStatus, CoreError> {
        let mut status = match self.execute(ctx, task).await {
            Ok(status) => self.generate(ctx, task, status)?,
            Err(e) => self.absorb(ctx, task, e)?,
        };
        debug!(task = %task.task_id, %status, "task run finished");

        self.enter(Stage::Uploading);
        status = status.worst(self.upload(ctx, task).await?);

        self.enter(Stage::Completing);
        let current = ctx.task().unwrap_or_else(|| task.clone());
        ctx.queue()
            .complete(&current, status)
            .await
            .map_err(|e| self.unexpected(ctx, Some(task), e))?;
        ctx.publish(
            Event::new(EventKind::TaskResolved)
                .with_task(&task.task_id)
                .with_status(status),
        );
        Ok(status)
    }

    /// Verify (when enabled), spawn, adopt and wait for the task process.
    async fn execute(&self, ctx: &Arc<Context>, task: &ClaimedTask) -> Result<ExitStatus, CoreError> {
        let cfg = ctx.config();
        if cfg.verify_chain_of_trust {
            self.enter(Stage::Verifying);
            let verifier = ctx.verifier().ok_or_else(|| {
                CoreError::Unexpected("chain of trust verification enabled without a verifier".into())
            })?;
            let chain = ChainOfTrust::new(&cfg.cot_job_type, task.clone(), cfg.work_dir.clone());
            self.token
                .verify_chain_of_trust(verifier.as_ref(), &chain)
                .await?;
        } else {
            ctx.publish(Event::new(EventKind::VerificationSkipped).with_task(&task.task_id));
        }

        self.enter(Stage::Executing);
        let process = self
            .token
            .run_cancellable(ctx.executor().spawn(task))
            .await?;
        let process = self.token.adopt_process(process);
        ctx.publish(
            Event::new(EventKind::ProcessAdopted)
                .with_task(&task.task_id)
                .with_reason(format!("pid {:?}", process.pid())),
        );

        // Not raced against the token: cancellation reaches the process itself,
        // which then exits with the worker-shutdown tier.
        let waited = process.wait().await;
        self.token.release_process();
        waited
    }

    /// Write the chain-of-trust artifact once the task process has exited.
    fn generate(&self, ctx: &Arc<Context>, task: &ClaimedTask, status: ExitStatus) -> Result<ExitStatus, CoreError> {
        if !ctx.config().generate_chain_of_trust {
            return Ok(status);
        }
        self.enter(Stage::Generating);
        match cot::generate(ctx.config(), task) {
            Ok(path) => {
                debug!(task = %task.task_id, path = %path.display(), "chain of trust written");
                Ok(status)
            }
            Err(e) => Ok(status.worst(self.absorb(ctx, task, e)?)),
        }
    }

    async fn upload(&self, ctx: &Arc<Context>, task: &ClaimedTask) -> Result<ExitStatus, CoreError> {
        let current = ctx.task().unwrap_or_else(|| task.clone());
        match self
            .token
            .run_cancellable(ctx.publisher().upload(&current))
            .await
        {
            Ok(()) => Ok(ExitStatus::Success),
            Err(e) => self.absorb(ctx, task, e),
        }
    }

    /// Fold a recognized failure into a status; hand back anything else.
    fn absorb(&self, ctx: &Context, task: &ClaimedTask, e: CoreError) -> Result<ExitStatus, CoreError> {
        let stage = self.stage();
        let status = match &e {
            CoreError::Worker(w) => w.status(),
            CoreError::Cancelled => ExitStatus::WorkerShutdown,
            CoreError::Transport(_) if stage == Stage::Uploading => ExitStatus::IntermittentTask,
            _ => return Err(self.unexpected(ctx, Some(task), e)),
        };
        ctx.publish(
            Event::new(EventKind::StageFailed)
                .with_task(&task.task_id)
                .with_stage(stage)
                .with_status(status)
                .with_reason(e.to_string()),
        );
        Ok(status)
    }

    fn unexpected(&self, ctx: &Context, task: Option<&ClaimedTask>, e: CoreError) -> CoreError {
        let stage = self.stage();
        error!(
            task = task.map(|t| t.task_id.as_str()),
            %stage,
            error = %e,
            "unexpected failure"
        );
        let mut event = Event::new(EventKind::UnexpectedFailure)
            .with_stage(stage)
            .with_reason(e.to_string());
        if let Some(task) = task {
            event = event.with_task(&task.task_id);
        }
        ctx.publish(event);
        e
    }

    fn cancelled(&self, ctx: &Context) -> Outcome {
        ctx.publish(Event::new(EventKind::IterationCancelled).with_stage(self.stage()));
        self.enter(Stage::Idle);
        Outcome::Cancelled
    }

    fn enter(&self, stage: Stage) {
        let mut current = lock(&self.stage);
        if *current != stage {
            trace!(from = %*current, to = %stage, "stage transition");
            *current = stage;
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
