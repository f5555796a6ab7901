//! Result handles.
//!
//! A [`ResultHandle`] is a value that becomes available later: blocking
//! retrieval with a timeout, best-effort cancellation, continuations, and
//! `Future` integration over one shared resolution. Once resolved, a handle
//! keeps its outcome and returns the same value (or the same error) on every
//! retrieval — declared return types are `Clone` for exactly this reason.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use crate::error::ClientError;

type Outcome<T> = Result<T, ClientError>;
type Callback<T> = Box<dyn FnOnce(Outcome<T>) + Send>;

struct State<T> {
    outcome: Option<Outcome<T>>,
    wakers: Vec<Waker>,
    callbacks: Vec<Callback<T>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    cond: Condvar,
    cancelled: AtomicBool,
}

impl<T: Clone> Shared<T> {
    /// First resolution wins; later attempts are ignored, which is what makes
    /// retrieval idempotent even when cancellation races completion.
    fn complete(&self, outcome: Outcome<T>) {
        let (callbacks, wakers) = {
            let mut state = self.state.lock().unwrap();
            if state.outcome.is_some() {
                return;
            }
            state.outcome = Some(outcome.clone());
            (
                std::mem::take(&mut state.callbacks),
                std::mem::take(&mut state.wakers),
            )
        };
        self.cond.notify_all();
        for callback in callbacks {
            callback(outcome.clone());
        }
        for waker in wakers {
            waker.wake();
        }
    }
}

/// Handle to the eventual result of one submitted unit of work.
pub struct ResultHandle<T> {
    shared: Arc<Shared<T>>,
}

impl<T> std::fmt::Debug for ResultHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultHandle").finish_non_exhaustive()
    }
}

impl<T> Clone for ResultHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> ResultHandle<T> {
    fn unresolved() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    outcome: None,
                    wakers: Vec::new(),
                    callbacks: Vec::new(),
                }),
                cond: Condvar::new(),
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    /// Whether an outcome has been recorded.
    pub fn is_resolved(&self) -> bool {
        self.shared.state.lock().unwrap().outcome.is_some()
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }
}

impl<T: Clone> ResultHandle<T> {
    /// Handle resolved before it is ever observed (inline strategy,
    /// submission-time failures).
    pub(crate) fn resolved(outcome: Outcome<T>) -> Self {
        let handle = Self::unresolved();
        handle.shared.complete(outcome);
        handle
    }

    /// Unresolved handle plus the completer that will resolve it.
    pub(crate) fn pending() -> (Self, Completer<T>) {
        let handle = Self::unresolved();
        let completer = Completer {
            shared: Arc::clone(&handle.shared),
        };
        (handle, completer)
    }

    /// Block until the outcome is available or `timeout` elapses.
    ///
    /// Expiry yields [`ClientError::Timeout`]; the underlying work keeps
    /// running and a later retrieval may still observe its outcome.
    pub fn wait(&self, timeout: Duration) -> Outcome<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock().unwrap();
        loop {
            if let Some(outcome) = state.outcome.clone() {
                return outcome;
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ClientError::Timeout(timeout));
            }
            let (guard, _) = self
                .shared
                .cond
                .wait_timeout(state, deadline - now)
                .unwrap();
            state = guard;
        }
    }

    /// Outcome if already resolved, without blocking.
    pub fn try_get(&self) -> Option<Outcome<T>> {
        self.shared.state.lock().unwrap().outcome.clone()
    }

    /// Request cancellation.
    ///
    /// Best-effort: work not yet started is prevented from starting, and the
    /// handle resolves to [`ClientError::Cancelled`] immediately if nothing
    /// resolved it first. A network call already issued may still take
    /// effect remotely.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        self.shared.complete(Err(ClientError::Cancelled));
    }

    /// Attach a continuation that runs with the outcome once it is
    /// available. Runs immediately (on the calling thread) if the handle is
    /// already resolved, otherwise on the thread that resolves it. The
    /// attaching thread never blocks.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        let mut callback = Some(callback);
        let ready = {
            let mut state = self.shared.state.lock().unwrap();
            match state.outcome.clone() {
                Some(outcome) => Some(outcome),
                None => {
                    state
                        .callbacks
                        .push(Box::new(callback.take().expect("unused callback")));
                    None
                }
            }
        };
        if let Some(outcome) = ready {
            (callback.take().expect("callback not queued"))(outcome);
        }
    }
}

impl<T: Clone> Future for ResultHandle<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.state.lock().unwrap();
        if let Some(outcome) = state.outcome.clone() {
            return Poll::Ready(outcome);
        }
        if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

/// Resolves the paired handle. Exactly one completer exists per pending
/// handle; if it is dropped without completing (worker pool torn down, work
/// panicked), the handle resolves to `Cancelled` rather than hanging waiters.
pub(crate) struct Completer<T: Clone> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone> Completer<T> {
    pub(crate) fn complete(self, outcome: Outcome<T>) {
        self.shared.complete(outcome);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }
}

impl<T: Clone> Drop for Completer<T> {
    fn drop(&mut self) {
        self.shared.complete(Err(ClientError::Cancelled));
    }
}
