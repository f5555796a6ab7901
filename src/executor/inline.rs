//! Inline executor strategy.
//!
//! For hosts that forbid background threads (sandboxed or request-scoped
//! runtimes). Work is driven to completion on the calling thread inside
//! `submit`, so the returned handle is already resolved when control comes
//! back — "asynchronous" calls are observably synchronous under this
//! strategy, by design of the constrained host.

use std::future::Future;
use std::sync::Mutex;

use crate::error::ClientError;
use crate::executor::handle::ResultHandle;

pub struct InlineStrategy {
    // Current-thread runtime; the mutex serializes submissions, which is the
    // whole point of the inline variant.
    runtime: Mutex<Option<tokio::runtime::Runtime>>,
}

impl InlineStrategy {
    pub fn new() -> Result<Self, ClientError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ClientError::Configuration(format!("inline runtime: {e}")))?;
        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
        })
    }

    /// Run `work` to completion on the calling thread and return the
    /// already-resolved handle.
    ///
    /// Must not be called from inside an async runtime; the constrained
    /// hosts this strategy serves do not have one.
    pub fn submit<T, F>(&self, work: F) -> ResultHandle<T>
    where
        T: Clone + Send + 'static,
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let guard = self.runtime.lock().unwrap();
        match guard.as_ref() {
            Some(runtime) => ResultHandle::resolved(runtime.block_on(work)),
            None => ResultHandle::resolved(Err(ClientError::Configuration(
                "executor strategy already shut down".to_string(),
            ))),
        }
    }

    /// Release the runtime. Nothing can be in flight here: submission only
    /// returns once its work has completed.
    pub fn shutdown(&self) {
        self.runtime.lock().unwrap().take();
    }
}
