//! HTTP transport abstraction.
//!
//! The pipeline only needs "issue one request, get status + headers + body
//! or a transport error". Exposing that as an injectable trait lets tests
//! (and constrained hosts) substitute a synthetic transport without touching
//! `reqwest`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::command::Command;
use crate::error::ClientError;

/// Wire-level request data, derived from a built command.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

impl WireRequest {
    /// Strip a command down to what actually goes on the wire.
    pub fn from_command(command: &Command) -> Self {
        Self {
            method: command.method.clone(),
            url: command.url.clone(),
            headers: command.headers.clone(),
            body: command.body.as_ref().map(|payload| payload.body.clone()),
        }
    }
}

/// Wire-level response data.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Issues one HTTP request and returns the raw outcome.
///
/// Implementations must be cheap to share (`Arc`) and must not retry; retry
/// policy, if any, lives behind this seam, not above it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn roundtrip(&self, request: WireRequest) -> Result<WireResponse, ClientError>;
}

/// Default transport over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a transport with the library's connection defaults.
    pub fn with_defaults(
        connect_timeout: Option<std::time::Duration>,
        user_agent: Option<&str>,
    ) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Configuration(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn roundtrip(&self, request: WireRequest) -> Result<WireResponse, ClientError> {
        let mut headers = HeaderMap::with_capacity(request.headers.len());
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::MalformedRequest(format!("header `{name}`: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::MalformedRequest(format!("header value: {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        // reqwest releases the connection once the body is fully read (or the
        // response is dropped on the error paths below).
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::TransportError(e.to_string()))?;

        Ok(WireResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OperationDescriptor;
    use crate::command::{Args, CommandBuilder};

    #[test]
    fn wire_request_mirrors_command() {
        let props = BTreeMap::new();
        let builder = CommandBuilder::new("https://api.example.com", &props);
        let descriptor = OperationDescriptor::new("GetMachine", Method::GET, "/my/machines/{id}")
            .with_accept("application/json");
        let command = builder
            .build(&descriptor, &Args::new().set("id", "m-9"))
            .unwrap();
        let request = WireRequest::from_command(&command);
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "https://api.example.com/my/machines/m-9");
        assert_eq!(
            request.headers.get("Accept").map(String::as_str),
            Some("application/json")
        );
        assert!(request.body.is_none());
    }
}
