//! Executor strategies.
//!
//! A strategy is the pluggable unit of execution: given a unit of work
//! (issue one request and shape its response), it runs it and hands back a
//! [`ResultHandle`]. Two variants exist — a general-purpose pooled strategy
//! and an inline strategy for hosts that forbid background threads. The
//! variant is chosen once at process configuration time and fixed for the
//! process lifetime; everything above this module is written against the
//! handle abstraction only.

pub mod handle;
mod inline;
mod pooled;

use std::future::Future;
use std::time::Duration;

pub use handle::ResultHandle;
pub use inline::InlineStrategy;
pub use pooled::PooledStrategy;

use crate::error::ClientError;

/// Which strategy variant to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyKind {
    /// Multi-thread worker pool; `workers = None` sizes it to the host.
    Pooled { workers: Option<usize> },
    /// Single-threaded, on-caller execution for constrained hosts.
    Inline,
}

/// Strategy selection plus teardown policy, set once at startup.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    /// How long shutdown drains in-flight work before cancelling it.
    pub shutdown_grace: Duration,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::Pooled { workers: None },
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl StrategyConfig {
    pub fn pooled() -> Self {
        Self::default()
    }

    pub fn pooled_with_workers(workers: usize) -> Self {
        Self {
            kind: StrategyKind::Pooled {
                workers: Some(workers),
            },
            ..Self::default()
        }
    }

    pub fn inline() -> Self {
        Self {
            kind: StrategyKind::Inline,
            ..Self::default()
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

/// The configured execution strategy. One per process; owns its runtime.
pub enum ExecutorStrategy {
    Pooled(PooledStrategy),
    Inline(InlineStrategy),
}

impl ExecutorStrategy {
    pub fn from_config(config: &StrategyConfig) -> Result<Self, ClientError> {
        Ok(match config.kind {
            StrategyKind::Pooled { workers } => {
                Self::Pooled(PooledStrategy::new(workers, config.shutdown_grace)?)
            }
            StrategyKind::Inline => Self::Inline(InlineStrategy::new()?),
        })
    }

    /// Run the unit of work and return a handle to its eventual result.
    ///
    /// A raised error from the work item is never swallowed; it is captured
    /// and exposed through the handle's retrieval path.
    pub fn submit<T, F>(&self, work: F) -> ResultHandle<T>
    where
        T: Clone + Send + 'static,
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        match self {
            Self::Pooled(pooled) => pooled.submit(work),
            Self::Inline(inline) => inline.submit(work),
        }
    }

    /// Under the inline strategy every returned handle is already resolved.
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }

    /// Release the strategy's runtime. Safe to call more than once; only the
    /// first call does the teardown.
    pub fn shutdown(&self) {
        match self {
            Self::Pooled(pooled) => pooled.shutdown(),
            Self::Inline(inline) => inline.shutdown(),
        }
    }
}
