//! Command model and builder.
//!
//! A [`Command`] is the immutable, fully resolved description of one HTTP
//! request plus the metadata needed to interpret its response. It is built
//! per invocation from an operation's static descriptor and the caller's
//! runtime arguments, and discarded after the call. Building is a pure
//! transformation: identical inputs always yield an equal command.

pub mod binder;
pub(crate) mod template;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use reqwest::Method;

use crate::catalog::OperationDescriptor;
use crate::command::binder::BoundPayload;
use crate::command::template::{Escaping, expand};
use crate::error::ClientError;

/// Named arguments supplied by the caller for one invocation.
///
/// Backed by an ordered map so argument iteration (and therefore command
/// construction) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    values: BTreeMap<String, String>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Immutable description of one planned HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Operation identifier, carried for logging only.
    pub operation: String,
    pub method: Method,
    /// Fully resolved absolute URL.
    pub url: String,
    /// Resolved header map (ordered for determinism).
    pub headers: BTreeMap<String, String>,
    /// Bound body, or none for body-less requests.
    pub body: Option<BoundPayload>,
    /// Statuses the operation treats as success.
    pub expected_statuses: BTreeSet<u16>,
    /// Per-operation override of the process-wide wait timeout.
    pub timeout: Option<Duration>,
}

impl Command {
    /// Copy of this command with one header added or replaced. Used by
    /// request filters, which produce a new command rather than mutating a
    /// shared one.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Builds commands against one endpoint with one set of context properties.
///
/// Properties fill template placeholders the caller did not bind (API
/// versions and similar context-level values); caller arguments always win.
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder<'a> {
    endpoint: &'a str,
    properties: &'a BTreeMap<String, String>,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(endpoint: &'a str, properties: &'a BTreeMap<String, String>) -> Self {
        Self {
            endpoint,
            properties,
        }
    }

    /// Resolve `descriptor` against `args` into a dispatchable command.
    ///
    /// Fails with [`ClientError::MalformedRequest`] if any path, header, or
    /// payload placeholder is left unresolved; nothing half-built escapes.
    pub fn build(
        &self,
        descriptor: &OperationDescriptor,
        args: &Args,
    ) -> Result<Command, ClientError> {
        let path = expand(
            &descriptor.path_template,
            args,
            self.properties,
            Escaping::Percent {
                skip: &descriptor.skip_encoding,
            },
        )?;
        let url = format!("{}{}", self.endpoint.trim_end_matches('/'), path);

        let mut headers = BTreeMap::new();
        for (name, value_template) in &descriptor.header_templates {
            let value = expand(value_template, args, self.properties, Escaping::Verbatim)?;
            headers.insert(name.clone(), value);
        }
        if let Some(accept) = &descriptor.accept {
            headers
                .entry("Accept".to_string())
                .or_insert_with(|| accept.clone());
        }

        let body = descriptor
            .binder
            .as_ref()
            .map(|binder| binder.bind(args))
            .transpose()?;
        let content_type = body
            .as_ref()
            .and_then(|payload| payload.content_type.clone())
            .or_else(|| descriptor.content_type.clone());
        if let Some(content_type) = content_type {
            headers
                .entry("Content-Type".to_string())
                .or_insert(content_type);
        }

        Ok(Command {
            operation: descriptor.id.clone(),
            method: descriptor.method.clone(),
            url,
            headers,
            body,
            expected_statuses: descriptor.expected_statuses.clone(),
            timeout: descriptor.timeout,
        })
    }
}
