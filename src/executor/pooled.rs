//! Pooled executor strategy.
//!
//! Owns a multi-thread runtime sized by the deployment. Submitted work runs
//! on a worker independent of the submitting thread, so any number of
//! commands can be in flight concurrently with no ordering guarantee between
//! them.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

use crate::error::ClientError;
use crate::executor::handle::ResultHandle;

pub struct PooledStrategy {
    runtime: Mutex<Option<tokio::runtime::Runtime>>,
    shutdown_grace: Duration,
}

impl PooledStrategy {
    pub fn new(workers: Option<usize>, shutdown_grace: Duration) -> Result<Self, ClientError> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all().thread_name("nimbus-worker");
        if let Some(workers) = workers {
            builder.worker_threads(workers);
        }
        let runtime = builder
            .build()
            .map_err(|e| ClientError::Configuration(format!("worker pool: {e}")))?;
        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            shutdown_grace,
        })
    }

    /// Hand the work to a pool worker and return an unresolved handle.
    ///
    /// A cancellation that lands before the worker picks the task up
    /// prevents the work from starting at all.
    pub fn submit<T, F>(&self, work: F) -> ResultHandle<T>
    where
        T: Clone + Send + 'static,
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let (handle, completer) = ResultHandle::pending();
        let guard = self.runtime.lock().unwrap();
        match guard.as_ref() {
            Some(runtime) => {
                runtime.spawn(async move {
                    if completer.is_cancelled() {
                        // Dropping the completer resolves the handle.
                        return;
                    }
                    let outcome = work.await;
                    completer.complete(outcome);
                });
            }
            None => {
                completer.complete(Err(ClientError::Configuration(
                    "executor strategy already shut down".to_string(),
                )));
            }
        }
        handle
    }

    /// Tear the pool down exactly once: drain in-flight work for the
    /// configured grace period, then cancel whatever remains. Subsequent
    /// submissions resolve to a configuration error.
    pub fn shutdown(&self) {
        if let Some(runtime) = self.runtime.lock().unwrap().take() {
            debug!(target: "nimbus::executor", grace = ?self.shutdown_grace, "shutting down worker pool");
            if self.shutdown_grace.is_zero() {
                runtime.shutdown_background();
            } else {
                runtime.shutdown_timeout(self.shutdown_grace);
            }
        }
    }
}

impl Drop for PooledStrategy {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.lock().unwrap().take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> PooledStrategy {
        PooledStrategy::new(Some(2), Duration::ZERO).unwrap()
    }

    #[test]
    fn work_resolves_on_a_worker() {
        let pool = strategy();
        let handle = pool.submit(async { Ok::<_, ClientError>(21 * 2) });
        assert_eq!(handle.wait(Duration::from_secs(5)).unwrap(), 42);
    }

    #[test]
    fn work_error_is_exposed_through_the_handle() {
        let pool = strategy();
        let handle = pool.submit(async {
            Err::<u32, _>(ClientError::TransportError("connection refused".into()))
        });
        let err = handle.wait(Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ClientError::TransportError(_)));
    }

    #[test]
    fn submissions_after_shutdown_fail_fast() {
        let pool = strategy();
        pool.shutdown();
        let handle = pool.submit(async { Ok::<_, ClientError>(1u32) });
        let err = handle.wait(Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn shutdown_is_idempotent() {
        let pool = strategy();
        pool.shutdown();
        pool.shutdown();
    }
}
