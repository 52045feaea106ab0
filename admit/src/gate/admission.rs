//! Gate implementation: slot pool, cancellation and drain barrier.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::{Notify, Semaphore, TryAcquireError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::permit::GatePermit;
use crate::error::GateError;

pub(crate) struct GateInner {
    pub(crate) capacity: usize,
    slots: Arc<Semaphore>,
    cancel_token: CancellationToken,
    /// Set by the first `cancel()` caller only.
    cancel_claimed: AtomicBool,
    /// Admitted and not yet exited. Also the drain barrier's counter.
    pub(crate) live: AtomicUsize,
    pub(crate) drained: Notify,
}

/// Point-in-time view of a gate for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct GateSnapshot {
    pub capacity: usize,
    pub live: usize,
    pub available: usize,
    pub canceled: bool,
}

impl GateSnapshot {
    /// All slots in use.
    pub fn is_saturated(&self) -> bool {
        self.live >= self.capacity
    }
}

/// Bounded-concurrency admission gate.
///
/// Cloning is cheap and every clone refers to the same gate, so one value can be
/// handed to every collaborator that throttles work.
#[derive(Clone)]
pub struct Gate {
    inner: Arc<GateInner>,
}

impl Gate {
    /// Create an open gate with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds `tokio::sync::Semaphore::MAX_PERMITS`.
    /// [`GateConfig::build`](crate::GateConfig::build) checks this and returns an error instead.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            inner: Arc::new(GateInner {
                capacity,
                slots: Arc::new(Semaphore::new(capacity)),
                cancel_token: CancellationToken::new(),
                cancel_claimed: AtomicBool::new(false),
                live: AtomicUsize::new(0),
                drained: Notify::new(),
            }),
        }
    }

    /// Wait for a slot, or fail as soon as the gate is canceled.
    ///
    /// Slot acquisition and cancellation are raced in a single `select!`, so a
    /// cancel that lands while this call is parked still wakes it.
    pub async fn enter(&self) -> Result<GatePermit, GateError> {
        let slot = tokio::select! {
            biased;
            _ = self.inner.cancel_token.cancelled() => return Err(GateError::Canceled),
            slot = Arc::clone(&self.inner.slots).acquire_owned() => {
                slot.map_err(|_| GateError::Canceled)?
            }
        };

        // Lost the race against a concurrent cancel: hand the slot back.
        if self.inner.cancel_token.is_cancelled() {
            return Err(GateError::Canceled);
        }

        Ok(GatePermit::admit(Arc::clone(&self.inner), slot))
    }

    /// Blocking [`enter`](Self::enter) for plain threads.
    ///
    /// Parks the calling thread. Do not call from inside an async task.
    pub fn enter_blocking(&self) -> Result<GatePermit, GateError> {
        futures::executor::block_on(self.enter())
    }

    /// Admit only if a slot is free right now.
    ///
    /// `Ok(None)` means the gate is open but full.
    pub fn try_enter(&self) -> Result<Option<GatePermit>, GateError> {
        if self.is_canceled() {
            return Err(GateError::Canceled);
        }

        match Arc::clone(&self.inner.slots).try_acquire_owned() {
            Ok(_) if self.is_canceled() => Err(GateError::Canceled),
            Ok(slot) => Ok(Some(GatePermit::admit(Arc::clone(&self.inner), slot))),
            Err(TryAcquireError::NoPermits) => Ok(None),
            Err(TryAcquireError::Closed) => Err(GateError::Canceled),
        }
    }

    /// Move the gate to `Canceled`. Safe to call any number of times from any thread.
    ///
    /// Returns `true` for the call that performed the transition. Every caller
    /// observes the gate as canceled once this returns. Permits already handed out
    /// stay valid and must still be exited.
    pub fn cancel(&self) -> bool {
        let first = !self.inner.cancel_claimed.swap(true, Ordering::AcqRel);

        self.inner.cancel_token.cancel();
        self.inner.slots.close();

        if first {
            tracing::debug!(
                live = self.count(),
                capacity = self.inner.capacity,
                "Gate canceled"
            );
        }
        first
    }

    /// Whether the gate has moved to `Canceled`.
    pub fn is_canceled(&self) -> bool {
        self.inner.cancel_token.is_cancelled()
    }

    /// Resolves once the gate is canceled. Resolves immediately if it already is.
    pub fn done(&self) -> impl Future<Output = ()> + Send + 'static {
        self.inner.cancel_token.clone().cancelled_owned()
    }

    /// Child token that fires when the gate is canceled.
    ///
    /// Canceling the child does not cancel the gate.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel_token.child_token()
    }

    /// Wait until every admitted operation has exited.
    ///
    /// Returns immediately when nothing is admitted. Does not stop new admissions;
    /// call [`cancel`](Self::cancel) first for that.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.live.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Blocking [`wait`](Self::wait) for plain threads.
    pub fn wait_blocking(&self) {
        futures::executor::block_on(self.wait())
    }

    /// Enter, then run `work` as its own tokio task holding the permit.
    ///
    /// The permit is released when the task finishes, fails or panics. On
    /// rejection nothing is spawned. Must be called from within a tokio runtime.
    pub async fn call<F>(&self, work: F) -> Result<JoinHandle<F::Output>, GateError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permit = self.enter().await?;
        Ok(tokio::spawn(async move {
            let _permit = permit;
            work.await
        }))
    }

    /// Enter (blocking), then run `work` on a dedicated OS thread holding the permit.
    pub fn call_blocking<F, T>(&self, work: F) -> Result<std::thread::JoinHandle<T>, GateError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.enter_blocking()?;
        // On spawn failure the closure, and the permit with it, is dropped.
        std::thread::Builder::new()
            .name("admit-call".to_string())
            .spawn(move || {
                let _permit = permit;
                work()
            })
            .map_err(GateError::Spawn)
    }

    /// Operations currently admitted. May be stale by the time it is read.
    pub fn count(&self) -> usize {
        self.inner.live.load(Ordering::Acquire)
    }

    /// Maximum number of concurrently admitted operations.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Free slots.
    pub fn available(&self) -> usize {
        self.inner.slots.available_permits()
    }

    /// Capture capacity, live count, free slots and cancellation in one value.
    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            capacity: self.inner.capacity,
            live: self.count(),
            available: self.available(),
            canceled: self.is_canceled(),
        }
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("capacity", &self.inner.capacity)
            .field("live", &self.count())
            .field("canceled", &self.is_canceled())
            .finish()
    }
}
