//! Operation descriptor table.
//!
//! Each REST operation a provider client exposes is described once, at
//! startup, by an [`OperationDescriptor`]: method, path template, header
//! templates, payload binder, expected statuses. A [`Catalog`] maps
//! operation ids to their descriptors. [`Operation`] pairs a descriptor with
//! its typed response transform and optional fallback — the complete recipe
//! the invoker needs.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::command::binder::PayloadBinder;
use crate::transform::{DiscardBody, Fallback, ParseJson, RawBytes, ResponseTransform};

/// Static metadata for one declared REST operation.
///
/// Built once at configuration time and shared; per-invocation data lives in
/// [`Args`](crate::command::Args), never here.
#[derive(Clone)]
pub struct OperationDescriptor {
    /// Stable identifier, used for catalog lookup and logging.
    pub id: String,
    pub method: Method,
    /// Path with named placeholders, e.g. `/my/machines/{id}`.
    pub path_template: String,
    /// Header name/value-template pairs.
    pub header_templates: Vec<(String, String)>,
    /// Desired response content type, sent as `Accept`.
    pub accept: Option<String>,
    /// Request content type when no binder supplies one.
    pub content_type: Option<String>,
    /// Body encoding, delegated so the builder stays payload-agnostic.
    pub binder: Option<Arc<dyn PayloadBinder>>,
    /// Statuses treated as success; everything else is a failure.
    pub expected_statuses: BTreeSet<u16>,
    /// Characters exempt from percent-encoding in path substitutions.
    pub skip_encoding: Vec<char>,
    /// Per-operation override of the process-wide wait timeout.
    pub timeout: Option<Duration>,
}

impl OperationDescriptor {
    /// Descriptor with the given identity and `200` as the only expected
    /// status; refine with the `with_*` builders.
    pub fn new(id: impl Into<String>, method: Method, path_template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method,
            path_template: path_template.into(),
            header_templates: Vec::new(),
            accept: None,
            content_type: None,
            binder: None,
            expected_statuses: BTreeSet::from([200]),
            skip_encoding: Vec::new(),
            timeout: None,
        }
    }

    /// Add a header whose value may contain `{name}` placeholders.
    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value_template: impl Into<String>,
    ) -> Self {
        self.header_templates
            .push((name.into(), value_template.into()));
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_binder(mut self, binder: Arc<dyn PayloadBinder>) -> Self {
        self.binder = Some(binder);
        self
    }

    /// Replace the expected success status set.
    pub fn with_expected_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.expected_statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_skip_encoding(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.skip_encoding = chars.into_iter().collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("path_template", &self.path_template)
            .field("expected_statuses", &self.expected_statuses)
            .finish_non_exhaustive()
    }
}

/// Operation-id → descriptor table, populated at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    operations: HashMap<String, Arc<OperationDescriptor>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its id, replacing any previous entry.
    pub fn register(mut self, descriptor: OperationDescriptor) -> Self {
        self.operations
            .insert(descriptor.id.clone(), Arc::new(descriptor));
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<OperationDescriptor>> {
        self.operations.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// A descriptor paired with its typed transform and optional fallback.
pub struct Operation<T> {
    descriptor: Arc<OperationDescriptor>,
    transform: Arc<dyn ResponseTransform<T>>,
    fallback: Option<Fallback<T>>,
}

impl<T> Clone for Operation<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            transform: Arc::clone(&self.transform),
            fallback: self.fallback.clone(),
        }
    }
}

impl<T> Operation<T> {
    pub fn new(
        descriptor: impl Into<Arc<OperationDescriptor>>,
        transform: Arc<dyn ResponseTransform<T>>,
    ) -> Self {
        Self {
            descriptor: descriptor.into(),
            transform,
            fallback: None,
        }
    }

    /// Attach a fallback substituting a typed value for a declared failure
    /// condition. Operations without one propagate every failure unchanged.
    pub fn with_fallback(mut self, fallback: Fallback<T>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    pub(crate) fn transform_arc(&self) -> Arc<dyn ResponseTransform<T>> {
        Arc::clone(&self.transform)
    }

    pub(crate) fn fallback(&self) -> Option<Fallback<T>> {
        self.fallback.clone()
    }
}

impl<T: DeserializeOwned + 'static> Operation<T> {
    /// Operation whose response body parses as JSON into `T`.
    pub fn json(descriptor: impl Into<Arc<OperationDescriptor>>) -> Self {
        Self::new(descriptor, ParseJson::<T>::new())
    }
}

impl Operation<()> {
    /// Operation whose response body is discarded.
    pub fn unit(descriptor: impl Into<Arc<OperationDescriptor>>) -> Self {
        Self::new(descriptor, DiscardBody::new())
    }
}

impl Operation<Bytes> {
    /// Operation returning the raw response bytes.
    pub fn bytes(descriptor: impl Into<Arc<OperationDescriptor>>) -> Self {
        Self::new(descriptor, RawBytes::new())
    }
}
