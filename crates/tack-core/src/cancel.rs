//! Cooperative cancellation of one orchestrator iteration.
//!
//! A [`CancelToken`] knows, at any instant, what a shutdown request would hit:
//! at most one in-flight cancellable operation and at most one adopted task process.
//! Registration happens before the foreground suspends and is cleared after it resumes,
//! both under the same lock that [`CancelToken::cancel`] takes, so a shutdown arriving
//! between any two foreground statements either sees the registration or is seen by it.

use std::{
    future::Future,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    collab::{ChainOfTrust, TaskProcess, TrustVerifier},
    error::{CoreError, WorkerError},
    sync::lock,
};

/// Anything the token can interrupt.
pub trait Cancellable: Send + Sync {
    fn cancel(&self);
}

impl Cancellable for CancellationToken {
    fn cancel(&self) {
        CancellationToken::cancel(self)
    }
}

impl Cancellable for tokio::task::AbortHandle {
    fn cancel(&self) {
        self.abort()
    }
}

/// Shared cancellation handle of one iteration. Cheap to clone.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

/// Non-owning reference kept by the process context for the shutdown path.
#[derive(Clone)]
pub struct WeakCancelToken {
    inner: Weak<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    slots: Mutex<Slots>,
}

#[derive(Default)]
struct Slots {
    in_flight: Option<Box<dyn Cancellable>>,
    process: Option<Adopted>,
}

struct Adopted {
    process: Arc<dyn TaskProcess>,
    signalled: bool,
}

impl Adopted {
    fn stop_once(&mut self) {
        if self.signalled {
            return;
        }
        self.signalled = true;
        warn!(
            pid = ?self.process.pid(),
            "worker is shutting down, but a task is running; terminating task"
        );
        self.process.stop_for_shutdown();
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                slots: Mutex::new(Slots::default()),
            }),
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn downgrade(&self) -> WeakCancelToken {
        WeakCancelToken {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether an operation is currently registered as in flight.
    pub fn has_in_flight(&self) -> bool {
        lock(&self.inner.slots).in_flight.is_some()
    }

    /// Whether a task process is currently adopted.
    pub fn has_process(&self) -> bool {
        lock(&self.inner.slots).process.is_some()
    }

    /// Run `op` as the single in-flight cancellable operation.
    ///
    /// Fails with [`CoreError::Cancelled`] without polling `op` when the token is
    /// already cancelled, and drops `op` when cancellation arrives while it is pending.
    pub async fn run_cancellable<F, T>(&self, op: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        let handle = CancellationToken::new();
        let _registered = self.register(handle.clone())?;

        tokio::select! {
            biased;
            _ = handle.cancelled() => Err(CoreError::Cancelled),
            res = op => res,
        }
    }

    /// Verify a chain of trust as a cancellable operation.
    ///
    /// Cancellation surfaces as [`WorkerError::chain_of_trust_aborted`] (worker-shutdown tier),
    /// never as a bare [`CoreError::Cancelled`].
    pub async fn verify_chain_of_trust(
        &self,
        verifier: &dyn TrustVerifier,
        chain: &ChainOfTrust,
    ) -> Result<(), CoreError> {
        if self.is_cancelled() {
            return Err(WorkerError::chain_of_trust_aborted().into());
        }
        match self.run_cancellable(verifier.verify(chain)).await {
            Err(CoreError::Cancelled) => Err(WorkerError::chain_of_trust_aborted().into()),
            other => other,
        }
    }

    /// Register the running task process.
    ///
    /// When the token was cancelled before the process got here, the process is asked to stop right away.
    pub fn adopt_process(&self, process: Arc<dyn TaskProcess>) -> Arc<dyn TaskProcess> {
        let mut slots = lock(&self.inner.slots);
        let adopted = slots.process.insert(Adopted {
            process: Arc::clone(&process),
            signalled: false,
        });
        if self.is_cancelled() {
            adopted.stop_once();
        }
        process
    }

    /// Forget the adopted process once it has exited.
    pub fn release_process(&self) {
        lock(&self.inner.slots).process = None;
    }

    /// Request cancellation. Idempotent, never blocks on the interrupted work.
    ///
    /// Returns `true` for the call that actually flipped the token.
    pub fn cancel(&self) -> bool {
        let mut slots = lock(&self.inner.slots);
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        debug!("cancel token flipped");

        if let Some(op) = &slots.in_flight {
            op.cancel();
        }
        if let Some(adopted) = slots.process.as_mut() {
            adopted.stop_once();
        }
        true
    }

    fn register(&self, handle: CancellationToken) -> Result<InFlight<'_>, CoreError> {
        let mut slots = lock(&self.inner.slots);
        if self.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        slots.in_flight = Some(Box::new(handle));
        Ok(InFlight { token: self })
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl WeakCancelToken {
    pub fn upgrade(&self) -> Option<CancelToken> {
        self.inner.upgrade().map(|inner| CancelToken { inner })
    }
}

/// Clears the in-flight slot when the foreground resumes, or when its future is dropped.
struct InFlight<'a> {
    token: &'a CancelToken,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(&self.token.inner.slots).in_flight = None;
    }
}
