//! HTTP command executor.
//!
//! Executes exactly one command's network call through the configured
//! [`Transport`] and classifies the outcome: an expected status passes the
//! raw response onward untouched, an unexpected status becomes
//! [`ClientError::RequestFailed`], and a wire failure surfaces as
//! [`ClientError::TransportError`]. Fallback substitution and response
//! transformation happen above this layer; no per-operation logic lives here.

pub mod filters;
pub mod transport;

use std::sync::Arc;

use tracing::{debug, trace};
use uuid::Uuid;

use crate::command::Command;
use crate::error::ClientError;
use crate::http::filters::RequestFilter;
use crate::http::transport::{Transport, WireRequest, WireResponse};

/// How much response body to carry in a `RequestFailed` message.
const ERROR_BODY_SNIPPET: usize = 256;

/// Issues one command per call and classifies the result.
pub struct HttpCommandExecutor {
    transport: Arc<dyn Transport>,
    filters: Vec<Arc<dyn RequestFilter>>,
}

impl HttpCommandExecutor {
    pub fn new(transport: Arc<dyn Transport>, filters: Vec<Arc<dyn RequestFilter>>) -> Self {
        Self { transport, filters }
    }

    /// Run the filters once, issue the request, classify the status.
    pub async fn issue(&self, command: Command) -> Result<WireResponse, ClientError> {
        let request_id = Uuid::new_v4().simple().to_string();

        let mut command = command;
        for filter in &self.filters {
            command = filter.filter(command)?;
        }

        debug!(
            target: "nimbus::http",
            %request_id,
            operation = %command.operation,
            method = %command.method,
            url = %command.url,
            "dispatching command"
        );

        let request = WireRequest::from_command(&command);
        let response = match self.transport.roundtrip(request).await {
            Ok(response) => response,
            Err(error) => {
                debug!(
                    target: "nimbus::http",
                    %request_id,
                    operation = %command.operation,
                    %error,
                    "transport failure"
                );
                return Err(error);
            }
        };

        if command.expected_statuses.contains(&response.status) {
            trace!(
                target: "nimbus::http",
                %request_id,
                operation = %command.operation,
                status = response.status,
                bytes = response.body.len(),
                "command succeeded"
            );
            Ok(response)
        } else {
            let message = body_snippet(&response);
            debug!(
                target: "nimbus::http",
                %request_id,
                operation = %command.operation,
                status = response.status,
                "unexpected status"
            );
            Err(ClientError::RequestFailed {
                status: response.status,
                message,
            })
        }
    }
}

fn body_snippet(response: &WireResponse) -> String {
    let text = String::from_utf8_lossy(&response.body);
    let mut snippet: String = text.chars().take(ERROR_BODY_SNIPPET).collect();
    if text.chars().count() > ERROR_BODY_SNIPPET {
        snippet.push_str("...");
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::Method;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use crate::catalog::OperationDescriptor;
    use crate::command::{Args, CommandBuilder};

    /// Transport answering a canned response and recording requests.
    struct CannedTransport {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<WireRequest>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn roundtrip(&self, request: WireRequest) -> Result<WireResponse, ClientError> {
            self.seen.lock().unwrap().push(request);
            Ok(WireResponse {
                status: self.status,
                headers: reqwest::header::HeaderMap::new(),
                body: Bytes::from(self.body),
            })
        }
    }

    fn list_command() -> Command {
        let props = BTreeMap::new();
        CommandBuilder::new("https://api.example.com", &props)
            .build(
                &OperationDescriptor::new("ListMachines", Method::GET, "/my/machines"),
                &Args::new(),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn expected_status_passes_raw_response_through() {
        let transport = CannedTransport::new(200, r#"[{"id":"m-1"}]"#);
        let executor = HttpCommandExecutor::new(transport.clone(), Vec::new());
        let response = executor.issue(list_command()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_ref(), br#"[{"id":"m-1"}]"#);
    }

    #[tokio::test]
    async fn unexpected_status_becomes_request_failed() {
        let transport = CannedTransport::new(500, "boom");
        let executor = HttpCommandExecutor::new(transport, Vec::new());
        let err = executor.issue(list_command()).await.unwrap_err();
        match err {
            ClientError::RequestFailed { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn filters_run_once_before_dispatch() {
        let transport = CannedTransport::new(200, "[]");
        let filter: Arc<dyn RequestFilter> =
            Arc::new(crate::http::filters::BasicAuthentication::new("u", "p"));
        let executor = HttpCommandExecutor::new(transport.clone(), vec![filter]);
        executor.issue(list_command()).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].headers.contains_key("Authorization"));
    }
}
