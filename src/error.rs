//! Error Handling Module
//!
//! Provides the error taxonomy for the command pipeline, plus classification
//! helpers (`category`, `is_retryable`) so callers can branch on failure
//! class instead of matching individual variants.
//!
//! Every variant owns its data, so `ClientError` is `Clone` — a resolved
//! [`ResultHandle`](crate::executor::ResultHandle) keeps its outcome and
//! hands out the same error on every retrieval.

use thiserror::Error;

/// Errors surfaced by the command pipeline.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// The command could not be built: missing argument, unresolved template
    /// placeholder, or an invalid header produced by a template.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The transport returned a status outside the operation's expected set
    /// and no fallback substitute was declared for it.
    #[error("Request failed with status {status}: {message}")]
    RequestFailed {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Reason phrase or a snippet of the response body.
        message: String,
    },

    /// Connection-level failure: DNS, connect, TLS, or mid-stream I/O.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// A blocking wait on a result handle exceeded the configured duration.
    /// Distinct from [`ClientError::TransportError`] so callers can retry on
    /// timeout only.
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The caller cancelled the handle, or the executor dropped the work
    /// before it produced an outcome.
    #[error("Operation cancelled")]
    Cancelled,

    /// The response transform could not shape the raw response into the
    /// operation's declared type.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Process-wide configuration problem (runtime construction failed,
    /// executor used after shutdown).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Coarse failure class, for caller-side branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller built an invalid request; retrying will not help.
    Usage,
    /// Provider rejected the request (4xx).
    Client,
    /// Provider-side failure (5xx).
    Server,
    /// The wire itself failed.
    Transport,
    /// The caller gave up waiting.
    Timeout,
}

impl ClientError {
    /// Shorthand for an unexpected-status failure.
    pub fn request_failed(status: u16, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify this error into a coarse category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedRequest(_) | Self::ParseError(_) | Self::Configuration(_) => {
                ErrorCategory::Usage
            }
            Self::RequestFailed { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::RequestFailed { .. } => ErrorCategory::Client,
            Self::TransportError(_) | Self::Cancelled => ErrorCategory::Transport,
            Self::Timeout(_) => ErrorCategory::Timeout,
        }
    }

    /// Whether an identical call could plausibly succeed if repeated.
    ///
    /// This core never retries; the hint is for callers that layer their own
    /// retry on top.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Server | ErrorCategory::Timeout
        )
    }
}
