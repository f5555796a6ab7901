//! nimbus
//!
//! A unified multi-cloud REST client toolkit: declarative operation
//! descriptors describe REST calls against cloud providers, and a shared
//! runtime turns them into wire requests and typed domain objects.
//!
//! The pipeline for one invocation:
//!
//! 1. An [`OperationDescriptor`](catalog::OperationDescriptor) plus the
//!    caller's [`Args`](command::Args) build an immutable
//!    [`Command`](command::Command).
//! 2. The [`Invoker`](invoker::Invoker) submits the work unit to the
//!    configured [`ExecutorStrategy`](executor::ExecutorStrategy) — a worker
//!    pool, or inline execution for hosts that forbid background threads.
//! 3. The [`HttpCommandExecutor`](http::HttpCommandExecutor) issues the
//!    request through the [`Transport`](http::transport::Transport) seam and
//!    classifies the outcome.
//! 4. Expected responses flow through the operation's declared
//!    [`ResponseTransform`](transform::ResponseTransform); declared failure
//!    classes are substituted by its [`Fallback`](transform::Fallback)
//!    (e.g. "404 means empty set"); everything else propagates.
//! 5. The caller gets the typed value synchronously (bounded by a timeout)
//!    or through a [`ResultHandle`](executor::ResultHandle).
//!
//! ```rust,ignore
//! use nimbus::prelude::*;
//!
//! let context = ClientConfig::new("https://api.example.com")
//!     .with_property("api_version", "~6.5")
//!     .with_filter(Arc::new(BasicAuthentication::new("user", "secret")))
//!     .build()?;
//!
//! let list_machines: Operation<Vec<Machine>> = Operation::json(
//!     OperationDescriptor::new("ListMachines", Method::GET, "/my/machines")
//!         .with_header("X-Api-Version", "{api_version}")
//!         .with_accept("application/json"),
//! )
//! .with_fallback(Fallback::empty_on_not_found());
//!
//! let machines = context.call(&list_machines, &Args::new())?;
//! ```

#![deny(unsafe_code)]

pub mod catalog;
pub mod command;
pub mod context;
pub mod error;
pub mod executor;
pub mod http;
pub mod invoker;
pub mod transform;

pub use error::{ClientError, ErrorCategory};

/// Common imports for declaring catalogs and making calls.
pub mod prelude {
    pub use crate::catalog::{Catalog, Operation, OperationDescriptor};
    pub use crate::command::binder::{FormBinder, JsonBinder, RawBinder};
    pub use crate::command::{Args, Command};
    pub use crate::context::{ClientConfig, ClientContext, DEFAULT_TIMEOUT};
    pub use crate::error::{ClientError, ErrorCategory};
    pub use crate::executor::{ExecutorStrategy, ResultHandle, StrategyConfig, StrategyKind};
    pub use crate::http::filters::{BasicAuthentication, RequestFilter};
    pub use crate::http::transport::{Transport, WireRequest, WireResponse};
    pub use crate::transform::{Fallback, FallbackCondition, ResponseTransform};
    pub use reqwest::Method;
}
