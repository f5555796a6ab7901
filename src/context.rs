//! Process-wide configuration and wiring.
//!
//! A [`ClientConfig`] is assembled once at startup and frozen into a
//! [`ClientContext`]: the executor strategy, the transport, the filter
//! chain, and the default timeout. The context is immutable thereafter;
//! `shutdown` releases the worker pool exactly once at process teardown.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::Operation;
use crate::command::Args;
use crate::error::ClientError;
use crate::executor::{ExecutorStrategy, ResultHandle, StrategyConfig};
use crate::http::HttpCommandExecutor;
use crate::http::filters::RequestFilter;
use crate::http::transport::{ReqwestTransport, Transport};
use crate::invoker::Invoker;

/// Process-wide default for blocking waits, overridable per operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!("nimbus/", env!("CARGO_PKG_VERSION"));

/// Configuration surface, consumed by [`ClientConfig::build`].
pub struct ClientConfig {
    endpoint: String,
    strategy: StrategyConfig,
    default_timeout: Duration,
    connect_timeout: Option<Duration>,
    user_agent: String,
    properties: BTreeMap<String, String>,
    filters: Vec<Arc<dyn RequestFilter>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientConfig {
    /// Configuration against one provider endpoint, pooled strategy and
    /// defaults everywhere else.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            strategy: StrategyConfig::default(),
            default_timeout: DEFAULT_TIMEOUT,
            connect_timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            properties: BTreeMap::new(),
            filters: Vec::new(),
            transport: None,
        }
    }

    pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Context-level property, available to every template as `{name}`
    /// (API versions and similar static values).
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Append a request filter; filters run in registration order.
    pub fn with_filter(mut self, filter: Arc<dyn RequestFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Replace the default reqwest transport (tests, constrained hosts).
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Freeze the configuration into a ready-to-use context.
    pub fn build(self) -> Result<ClientContext, ClientError> {
        let strategy = Arc::new(ExecutorStrategy::from_config(&self.strategy)?);
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_defaults(
                self.connect_timeout,
                Some(&self.user_agent),
            )?),
        };
        let http = Arc::new(HttpCommandExecutor::new(transport, self.filters));
        let invoker = Invoker::new(
            http,
            Arc::clone(&strategy),
            self.endpoint,
            self.properties,
            self.default_timeout,
        );
        Ok(ClientContext { invoker, strategy })
    }
}

/// Immutable process-wide wiring: invoker plus the strategy it submits to.
pub struct ClientContext {
    invoker: Invoker,
    strategy: Arc<ExecutorStrategy>,
}

impl ClientContext {
    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    /// Synchronous facade: block up to the operation's timeout.
    pub fn call<T>(&self, operation: &Operation<T>, args: &Args) -> Result<T, ClientError>
    where
        T: Clone + Send + 'static,
    {
        self.invoker.call(operation, args)
    }

    /// Asynchronous facade: non-blocking, returns the handle.
    pub fn submit<T>(
        &self,
        operation: &Operation<T>,
        args: &Args,
    ) -> Result<ResultHandle<T>, ClientError>
    where
        T: Clone + Send + 'static,
    {
        self.invoker.submit(operation, args)
    }

    /// Whether the configured strategy resolves handles inline.
    pub fn is_inline(&self) -> bool {
        self.strategy.is_inline()
    }

    /// Release the executor strategy's runtime. Safe to call repeatedly;
    /// the first call tears down, later calls are no-ops.
    pub fn shutdown(&self) {
        self.strategy.shutdown();
    }
}
