//! Handler traits and the context they receive.
//!
//! Three kinds of handler can be registered on a mapping:
//!
//! - [`HateosResourceHandler`]: typed values in and out. The router
//!   negotiates the media type, unmarshalls the body and marshalls the result.
//! - [`HateosHttpEntityHandler`]: raw bytes and headers in and out. Only the
//!   `Content-Length` checks run before it.
//! - [`HateosHttpHandler`]: the whole request, answered with a whole
//!   response. Registered by path name rather than link relation.
//!
//! Every per-selection method has a default that answers 501, so a handler
//! implements only the selection shapes it supports.

use std::collections::BTreeMap;

use bytes::Bytes;
use hateos_codec::MediaType;
use hateos_model::{HttpMethod, LinkRelation, ResourceName, Selection, SelectionRange};
use http::HeaderMap;

use crate::HandlerError;

/// What a resource handler returns: `None` answers 204.
pub type HandlerResult<T> = Result<Option<T>, HandlerError>;

/// Request facts known once the resource name has been resolved.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub(crate) method: HttpMethod,
    pub(crate) resource: ResourceName,
    pub(crate) base_path: String,
    pub(crate) media_type: MediaType,
    pub(crate) parameters: BTreeMap<String, Vec<String>>,
    pub(crate) headers: HeaderMap,
}

impl RequestContext {
    /// Build a context by hand, e.g. to call a handler from a test.
    #[must_use]
    pub fn new(method: HttpMethod, resource: ResourceName, media_type: MediaType) -> Self {
        Self {
            method,
            resource,
            base_path: String::new(),
            media_type,
            parameters: BTreeMap::new(),
            headers: HeaderMap::new(),
        }
    }

    /// Parse a raw query string into the parameter table.
    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        self.parameters = parse_query(query);
        self
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    /// The resolved resource name.
    #[must_use]
    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    /// The router base path, e.g. `/api`. Empty for a router mounted at `/`.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// The router's media type.
    #[must_use]
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// All query parameters, each with every value in request order.
    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, Vec<String>> {
        &self.parameters
    }

    /// The first value of a query parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

pub(crate) fn parse_query(query: &str) -> BTreeMap<String, Vec<String>> {
    let mut parameters: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        parameters
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    parameters
}

/// The context handed to resource and entity handlers.
#[derive(Debug, Clone)]
pub struct HateosContext {
    request: RequestContext,
    relation: LinkRelation,
}

impl HateosContext {
    /// Pair a request context with the resolved link relation.
    #[must_use]
    pub fn new(request: RequestContext, relation: LinkRelation) -> Self {
        Self { request, relation }
    }

    /// The request facts.
    #[must_use]
    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    /// The link relation being invoked.
    #[must_use]
    pub fn relation(&self) -> &LinkRelation {
        &self.relation
    }

    /// Shortcut for [`RequestContext::parameter`].
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.request.parameter(name)
    }
}

/// Typed handler for one `(relation, method)` of a resource.
///
/// `I` is the id type, `V` a single value and `C` a collection of values.
/// Request bodies arrive unmarshalled; `None` means the request had no body.
#[allow(unused_variables)]
pub trait HateosResourceHandler<I, V, C>: Send + Sync {
    /// `/{resource}`. A `Some` result answers 201.
    fn handle_none(&self, resource: Option<V>, context: &HateosContext) -> HandlerResult<V> {
        Err(HandlerError::unsupported())
    }

    /// `/{resource}/{id}`
    fn handle_one(&self, id: &I, resource: Option<V>, context: &HateosContext) -> HandlerResult<V> {
        Err(HandlerError::unsupported())
    }

    /// `/{resource}/*`
    fn handle_all(&self, resources: Option<C>, context: &HateosContext) -> HandlerResult<C> {
        Err(HandlerError::unsupported())
    }

    /// `/{resource}/{lower}-{upper}`
    fn handle_range(
        &self,
        range: &SelectionRange<I>,
        resources: Option<C>,
        context: &HateosContext,
    ) -> HandlerResult<C> {
        Err(HandlerError::unsupported())
    }

    /// `/{resource}/{id},{id},...`
    fn handle_many(
        &self,
        ids: &[I],
        resources: Option<C>,
        context: &HateosContext,
    ) -> HandlerResult<C> {
        Err(HandlerError::unsupported())
    }
}

/// Request or response headers plus body bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpEntity {
    /// Headers.
    pub headers: HeaderMap,
    /// Body.
    pub body: Bytes,
}

impl HttpEntity {
    /// An entity with no headers.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Add a header. Invalid values are dropped.
    #[must_use]
    pub fn with_header(mut self, name: http::header::HeaderName, value: &str) -> Self {
        if let Ok(value) = http::HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Byte-level handler for one `(relation, method)` of a resource. An empty
/// response body answers 204, anything else 200 with the returned headers.
#[allow(unused_variables)]
pub trait HateosHttpEntityHandler<I>: Send + Sync {
    /// `/{resource}`
    fn handle_none(
        &self,
        entity: HttpEntity,
        context: &HateosContext,
    ) -> Result<HttpEntity, HandlerError> {
        Err(HandlerError::unsupported())
    }

    /// `/{resource}/{id}`
    fn handle_one(
        &self,
        id: &I,
        entity: HttpEntity,
        context: &HateosContext,
    ) -> Result<HttpEntity, HandlerError> {
        Err(HandlerError::unsupported())
    }

    /// `/{resource}/*`
    fn handle_all(
        &self,
        entity: HttpEntity,
        context: &HateosContext,
    ) -> Result<HttpEntity, HandlerError> {
        Err(HandlerError::unsupported())
    }

    /// `/{resource}/{lower}-{upper}`
    fn handle_range(
        &self,
        range: &SelectionRange<I>,
        entity: HttpEntity,
        context: &HateosContext,
    ) -> Result<HttpEntity, HandlerError> {
        Err(HandlerError::unsupported())
    }

    /// `/{resource}/{id},{id},...`
    fn handle_many(
        &self,
        ids: &[I],
        entity: HttpEntity,
        context: &HateosContext,
    ) -> Result<HttpEntity, HandlerError> {
        Err(HandlerError::unsupported())
    }
}

/// Handler that owns the whole exchange for `/{resource}/{selection}/{path name}/...`.
///
/// It runs right after the selection is parsed: no relation, method or
/// content checks are applied.
pub trait HateosHttpHandler<I>: Send + Sync {
    /// Answer the request. `extra_path` holds the decoded segments after the
    /// path name.
    fn handle(
        &self,
        selection: &Selection<I>,
        extra_path: &[String],
        request: &http::Request<Bytes>,
        context: &RequestContext,
    ) -> http::Response<Bytes>;
}
