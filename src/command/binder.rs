//! Payload binders.
//!
//! The command builder does not know provider payload shapes; a binder turns
//! the caller's named arguments into an opaque body. Stock binders cover the
//! shapes the operation catalogs declare: form-encoded action payloads,
//! JSON templates, and fixed raw bodies.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::command::Args;
use crate::command::template::{Escaping, expand};
use crate::error::ClientError;

/// A fully bound request body.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundPayload {
    /// Content type the body should be sent with, if the binder knows it.
    pub content_type: Option<String>,
    /// Opaque serialized body.
    pub body: Bytes,
}

/// Encodes caller arguments into a request body.
///
/// Binders are pure: binding the same arguments twice yields the same
/// payload, which keeps built commands deterministic.
pub trait PayloadBinder: Send + Sync {
    fn bind(&self, args: &Args) -> Result<BoundPayload, ClientError>;
}

/// Form-encoded payload from a template such as `action=resize&package={package}`.
///
/// Literal text is sent as written; substituted values are percent-encoded.
pub struct FormBinder {
    template: String,
}

impl FormBinder {
    pub fn new(template: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            template: template.into(),
        })
    }
}

impl PayloadBinder for FormBinder {
    fn bind(&self, args: &Args) -> Result<BoundPayload, ClientError> {
        let empty = BTreeMap::new();
        let body = expand(&self.template, args, &empty, Escaping::Percent { skip: &[] })?;
        Ok(BoundPayload {
            content_type: Some("application/x-www-form-urlencoded".to_string()),
            body: Bytes::from(body),
        })
    }
}

/// JSON payload built from a template value; every string leaf may contain
/// `{name}` placeholders resolved from the caller's arguments.
pub struct JsonBinder {
    template: serde_json::Value,
}

impl JsonBinder {
    pub fn new(template: serde_json::Value) -> Arc<Self> {
        Arc::new(Self { template })
    }

    fn resolve(value: &serde_json::Value, args: &Args) -> Result<serde_json::Value, ClientError> {
        use serde_json::Value;
        let empty = BTreeMap::new();
        Ok(match value {
            Value::String(s) => Value::String(expand(s, args, &empty, Escaping::Verbatim)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|v| Self::resolve(v, args))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), Self::resolve(v, args)?);
                }
                Value::Object(out)
            }
            other => other.clone(),
        })
    }
}

impl PayloadBinder for JsonBinder {
    fn bind(&self, args: &Args) -> Result<BoundPayload, ClientError> {
        let resolved = Self::resolve(&self.template, args)?;
        let body = serde_json::to_vec(&resolved)
            .map_err(|e| ClientError::MalformedRequest(format!("payload serialization: {e}")))?;
        Ok(BoundPayload {
            content_type: Some("application/json".to_string()),
            body: Bytes::from(body),
        })
    }
}

/// Fixed raw body, identical on every invocation.
pub struct RawBinder {
    content_type: Option<String>,
    body: Bytes,
}

impl RawBinder {
    pub fn new(content_type: Option<String>, body: impl Into<Bytes>) -> Arc<Self> {
        Arc::new(Self {
            content_type,
            body: body.into(),
        })
    }
}

impl PayloadBinder for RawBinder {
    fn bind(&self, _args: &Args) -> Result<BoundPayload, ClientError> {
        Ok(BoundPayload {
            content_type: self.content_type.clone(),
            body: self.body.clone(),
        })
    }
}
