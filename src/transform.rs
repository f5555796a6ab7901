//! Response transforms and fallback policies.
//!
//! A [`ResponseTransform`] shapes a raw wire response into the operation's
//! declared return type. A [`Fallback`] converts a declared class of
//! failures into a substitute value of that same type — the substitute is
//! already finally typed and bypasses the transform entirely, which is how
//! "404 means empty set" works without per-call error handling.

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::http::transport::WireResponse;

/// Shapes a raw response into the operation's declared return type.
///
/// Runs only on responses the HTTP executor classified as expected; failures
/// never reach a transform.
pub trait ResponseTransform<T>: Send + Sync {
    fn transform(&self, response: WireResponse) -> Result<T, ClientError>;
}

/// Parse the response body as JSON into `T`.
pub struct ParseJson<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ParseJson<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            _marker: PhantomData,
        })
    }
}

impl<T: DeserializeOwned> ResponseTransform<T> for ParseJson<T> {
    fn transform(&self, response: WireResponse) -> Result<T, ClientError> {
        serde_json::from_slice(&response.body).map_err(|e| ClientError::ParseError(e.to_string()))
    }
}

/// Discard the body and return nothing. For action operations whose only
/// interesting outcome is the status code.
pub struct DiscardBody;

impl DiscardBody {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl ResponseTransform<()> for DiscardBody {
    fn transform(&self, _response: WireResponse) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Return the response body bytes unmodified.
pub struct RawBytes;

impl RawBytes {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl ResponseTransform<Bytes> for RawBytes {
    fn transform(&self, response: WireResponse) -> Result<Bytes, ClientError> {
        Ok(response.body)
    }
}

/// Failure class a fallback substitutes for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackCondition {
    /// The provider answered 404.
    NotFound,
    /// The provider answered with any status in this set.
    Statuses(BTreeSet<u16>),
    /// The wire itself failed (connection, DNS, mid-stream I/O).
    TransportFailure,
}

impl FallbackCondition {
    fn matches(&self, error: &ClientError) -> bool {
        match self {
            Self::NotFound => error.status_code() == Some(404),
            Self::Statuses(set) => error
                .status_code()
                .is_some_and(|status| set.contains(&status)),
            Self::TransportFailure => matches!(error, ClientError::TransportError(_)),
        }
    }
}

/// Per-operation rule converting a declared failure condition into a
/// substitute success value.
///
/// The substitute factory must be pure: it is invoked once per matching
/// failure and must yield an equivalent value every time.
pub struct Fallback<T> {
    condition: FallbackCondition,
    substitute: Arc<dyn Fn() -> T + Send + Sync>,
}

impl<T> Clone for Fallback<T> {
    fn clone(&self) -> Self {
        Self {
            condition: self.condition.clone(),
            substitute: Arc::clone(&self.substitute),
        }
    }
}

impl<T> Fallback<T> {
    /// Substitute the value produced by `substitute` whenever `condition`
    /// matches the failure.
    pub fn on(
        condition: FallbackCondition,
        substitute: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            condition,
            substitute: Arc::new(substitute),
        }
    }

    /// Not-found yields the type's empty value (empty vec, empty map, ...).
    pub fn empty_on_not_found() -> Self
    where
        T: Default + 'static,
    {
        Self::on(FallbackCondition::NotFound, T::default)
    }

    /// Whether this fallback substitutes for `error`.
    pub fn matches(&self, error: &ClientError) -> bool {
        self.condition.matches(error)
    }

    /// Produce the substitute value.
    pub fn substitute(&self) -> T {
        (self.substitute)()
    }
}

impl<U> Fallback<Option<U>> {
    /// Not-found yields `None` instead of an error.
    pub fn none_on_not_found() -> Self {
        Self::on(FallbackCondition::NotFound, || None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> WireResponse {
        WireResponse {
            status: 200,
            headers: reqwest::header::HeaderMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn parse_json_shapes_domain_objects() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Machine {
            id: String,
        }
        let transform = ParseJson::<Vec<Machine>>::new();
        let machines = transform
            .transform(response(r#"[{"id":"m-1"},{"id":"m-2"}]"#))
            .unwrap();
        assert_eq!(machines.len(), 2);
        assert_eq!(machines[0].id, "m-1");
    }

    #[test]
    fn parse_json_reports_parse_error() {
        let transform = ParseJson::<Vec<String>>::new();
        let err = transform.transform(response("not json")).unwrap_err();
        assert!(matches!(err, ClientError::ParseError(_)));
    }

    #[test]
    fn discard_body_ignores_content() {
        DiscardBody::new()
            .transform(response("anything at all"))
            .unwrap();
    }

    #[test]
    fn not_found_fallback_matches_404_only() {
        let fallback = Fallback::<Vec<String>>::empty_on_not_found();
        assert!(fallback.matches(&ClientError::request_failed(404, "gone")));
        assert!(!fallback.matches(&ClientError::request_failed(500, "boom")));
        assert!(!fallback.matches(&ClientError::TransportError("refused".into())));
        assert!(fallback.substitute().is_empty());
    }

    #[test]
    fn none_on_not_found_substitutes_absent_value() {
        let fallback = Fallback::<Option<String>>::none_on_not_found();
        assert!(fallback.matches(&ClientError::request_failed(404, "gone")));
        assert_eq!(fallback.substitute(), None);
    }

    #[test]
    fn status_set_condition_matches_declared_statuses() {
        let fallback = Fallback::<u32>::on(
            FallbackCondition::Statuses([404, 410].into_iter().collect()),
            || 0,
        );
        assert!(fallback.matches(&ClientError::request_failed(410, "gone")));
        assert!(!fallback.matches(&ClientError::request_failed(409, "conflict")));
    }
}
