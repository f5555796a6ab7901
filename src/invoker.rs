//! The invoker: one shared invocation path, two calling conventions.
//!
//! Bridges the raw-response world of the HTTP executor to each operation's
//! declared return type. Every invocation walks the same states: build the
//! command, submit the work unit, classify the outcome, then either apply
//! the declared transform (success), substitute the declared fallback value
//! (remapped failure), or propagate the failure. The blocking adapter and
//! the handle-returning adapter are both thin wrappers over this one path.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::catalog::Operation;
use crate::command::{Args, CommandBuilder};
use crate::error::ClientError;
use crate::executor::{ExecutorStrategy, ResultHandle};
use crate::http::HttpCommandExecutor;

pub struct Invoker {
    http: Arc<HttpCommandExecutor>,
    strategy: Arc<ExecutorStrategy>,
    endpoint: String,
    properties: BTreeMap<String, String>,
    default_timeout: Duration,
}

impl Invoker {
    pub fn new(
        http: Arc<HttpCommandExecutor>,
        strategy: Arc<ExecutorStrategy>,
        endpoint: impl Into<String>,
        properties: BTreeMap<String, String>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            http,
            strategy,
            endpoint: endpoint.into(),
            properties,
            default_timeout,
        }
    }

    /// Asynchronous adapter: build the command and hand back the handle.
    ///
    /// Build failures (missing argument, unresolved placeholder) surface
    /// immediately as `Err`; nothing is submitted for them. Under the inline
    /// strategy the returned handle is already resolved.
    pub fn submit<T>(
        &self,
        operation: &Operation<T>,
        args: &Args,
    ) -> Result<ResultHandle<T>, ClientError>
    where
        T: Clone + Send + 'static,
    {
        let command =
            CommandBuilder::new(&self.endpoint, &self.properties).build(operation.descriptor(), args)?;
        let http = Arc::clone(&self.http);
        let transform = operation.transform_arc();
        let fallback = operation.fallback();
        let operation_id = command.operation.clone();

        Ok(self.strategy.submit(async move {
            match http.issue(command).await {
                Ok(raw) => transform.transform(raw),
                Err(error) => match fallback {
                    // The substitute is already the finally declared type; it
                    // bypasses the transform.
                    Some(fallback) if fallback.matches(&error) => {
                        debug!(
                            target: "nimbus::invoker",
                            operation = %operation_id,
                            %error,
                            "substituting declared fallback value"
                        );
                        Ok(fallback.substitute())
                    }
                    _ => Err(error),
                },
            }
        }))
    }

    /// Synchronous adapter: block on the handle up to the operation's
    /// timeout (process-wide default otherwise). Expiry surfaces as
    /// [`ClientError::Timeout`].
    pub fn call<T>(&self, operation: &Operation<T>, args: &Args) -> Result<T, ClientError>
    where
        T: Clone + Send + 'static,
    {
        let timeout = operation
            .descriptor()
            .timeout
            .unwrap_or(self.default_timeout);
        self.submit(operation, args)?.wait(timeout)
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}
