use std::{future::Future, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use crate::{
    context::Context,
    error::CoreError,
    event::{Event, EventKind},
    fs,
    orchestrator::{Orchestrator, Outcome},
};

/// Outermost driver: repeats orchestrator iterations until shutdown.
pub struct Worker {
    ctx: Arc<Context>,
    shutdown: CancellationToken,
}

/// Entry point for the shutdown signal.
///
/// Sets the worker's shutdown flag and cancels whichever iteration is registered in the context.
/// With no iteration in flight the loop notices the flag on its next check.
#[derive(Clone)]
pub struct ShutdownHandle {
    ctx: Arc<Context>,
    shutdown: CancellationToken,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            trace!("shutdown already requested");
            return;
        }
        info!("shutdown requested");
        self.ctx.publish(Event::new(EventKind::ShutdownRequested));
        self.shutdown.cancel();
        self.ctx.cancel_running();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Worker {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            ctx,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            ctx: Arc::clone(&self.ctx),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Run one iteration with a fresh orchestrator registered in the context.
    pub async fn run_tasks(&self) -> Result<Outcome, CoreError> {
        let orchestrator = Orchestrator::new();
        let _registration = self.ctx.register_running(orchestrator.token());
        // Shutdown may have landed before the registration was visible.
        if self.shutdown.is_cancelled() {
            orchestrator.token().cancel();
        }
        orchestrator.invoke(&self.ctx).await
    }

    /// Loop until shutdown. An error is an unrecognized fault; the caller should exit non-zero.
    pub async fn run(&self) -> Result<(), CoreError> {
        if let Err(e) = fs::cleanup(self.ctx.config()) {
            warn!(error = %e, "startup cleanup failed");
        }
        info!(
            worker_type = %self.ctx.config().worker_type,
            worker_id = %self.ctx.config().worker_id,
            "worker started"
        );

        while !self.shutdown.is_cancelled() {
            match self.run_tasks().await {
                Ok(Outcome::Cancelled) => break,
                Ok(outcome) => trace!(?outcome, "iteration done"),
                Err(e) => {
                    error!(error = %e, "fatal failure; worker stopping");
                    return Err(e);
                }
            }
        }

        info!("worker stopped");
        Ok(())
    }

    /// [`Worker::run`] with `signal` wired to the shutdown handle.
    pub async fn run_until<F>(&self, signal: F) -> Result<(), CoreError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.shutdown_handle();
        let watcher = tokio::spawn(async move {
            signal.await;
            handle.shutdown();
        });
        let res = self.run().await;
        watcher.abort();
        res
    }
}
