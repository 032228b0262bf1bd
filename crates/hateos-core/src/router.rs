//! Request routing.
//!
//! ```text
//! {base}/{resource}[/{selection}[/{relation or path name}[/{extra...}]]]
//! ```
//!
//! The path is normalized once (`.` dropped, `..` pops, segments
//! percent-decoded) and matched against the base path segment by segment.
//! A router answers every request under its base path, even if only with an
//! error; requests elsewhere are not routed at all.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use hateos_codec::{Marshall, MarshallContext, MediaType, TypeRegistry, Unmarshall};
use hateos_model::{HateosError, HateosResource, HttpMethod, ResourceName};
use percent_encoding::percent_decode_str;
use tracing::{debug, error, warn};

use crate::dispatch::{DispatchRequest, MappingDispatch};
use crate::handler::{RequestContext, parse_query};
use crate::response::error_to_response;
use crate::{BuildError, HateosResourceMapping, LinkInjector};

/// Split a URL path into normalized, percent-decoded segments.
///
/// A trailing slash yields a trailing empty segment.
#[must_use]
pub fn normalize_path(path: &str) -> Vec<String> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let mut segments: Vec<String> = Vec::new();
    if trimmed.is_empty() {
        return segments;
    }
    for raw in trimmed.split('/') {
        match raw {
            "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(percent_decode_str(raw).decode_utf8_lossy().into_owned()),
        }
    }
    segments
}

struct RouterShared {
    base_path: String,
    base_segments: Vec<String>,
    media_type: MediaType,
    mappings: HashMap<ResourceName, Box<dyn MappingDispatch>>,
    marshall: MarshallContext,
}

/// An immutable router over a set of resource mappings. Cheap to clone.
#[derive(Clone)]
pub struct HateosRouter {
    shared: Arc<RouterShared>,
}

impl fmt::Debug for HateosRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&ResourceName> = self.shared.mappings.keys().collect();
        names.sort();
        f.debug_struct("HateosRouter")
            .field("base_path", &self.shared.base_path)
            .field("media_type", &self.shared.media_type)
            .field("resources", &names)
            .finish_non_exhaustive()
    }
}

/// Collects mappings and settings for a [`HateosRouter`].
pub struct HateosRouterBuilder {
    base_path: String,
    media_type: MediaType,
    registry: TypeRegistry,
    mappings: Vec<Box<dyn MappingDispatch>>,
}

impl fmt::Debug for HateosRouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HateosRouterBuilder")
            .field("base_path", &self.base_path)
            .field("media_type", &self.media_type)
            .field("mappings", &self.mappings.len())
            .finish_non_exhaustive()
    }
}

impl HateosRouterBuilder {
    /// Set the media type (default JSON).
    #[must_use]
    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    /// Set the type registry used for polymorphic values.
    #[must_use]
    pub fn type_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add a resource mapping.
    #[must_use]
    pub fn mapping<I, V, C, R>(mut self, mapping: HateosResourceMapping<I, V, C, R>) -> Self
    where
        I: Send + Sync + 'static,
        V: Marshall + Unmarshall + Send + 'static,
        C: Marshall + Unmarshall + Send + 'static,
        R: HateosResource,
    {
        self.mappings.push(Box::new(mapping));
        self
    }

    /// Validate the mappings and build the router and its link injector.
    pub fn build(self) -> Result<HateosRouter, BuildError> {
        let base_segments = parse_base_path(&self.base_path)?;
        let base_path = if base_segments.is_empty() {
            String::new()
        } else {
            format!("/{}", base_segments.join("/"))
        };

        let mut injector = LinkInjector::new(base_path.clone(), self.media_type);
        let mut types: HashMap<std::any::TypeId, ResourceName> = HashMap::new();
        let mut mappings: HashMap<ResourceName, Box<dyn MappingDispatch>> = HashMap::new();

        for mapping in self.mappings {
            let name = mapping.name().clone();
            if mappings.contains_key(&name) {
                return Err(BuildError::DuplicateResourceName(name));
            }
            let (type_id, type_name) = mapping.resource_type();
            if let Some(first) = types.get(&type_id) {
                return Err(BuildError::DuplicateResourceType {
                    type_name,
                    first: first.clone(),
                    second: name,
                });
            }
            types.insert(type_id, name.clone());
            injector.insert(type_id, name.clone(), mapping.bindings());
            mappings.insert(name, mapping);
        }

        debug!(
            base_path = %base_path,
            media_type = %self.media_type,
            resources = mappings.len(),
            "built hateos router"
        );

        let marshall = MarshallContext::new(self.registry).with_post_processor(Arc::new(injector));
        Ok(HateosRouter {
            shared: Arc::new(RouterShared {
                base_path,
                base_segments,
                media_type: self.media_type,
                mappings,
                marshall,
            }),
        })
    }
}

fn parse_base_path(base_path: &str) -> Result<Vec<String>, BuildError> {
    let Some(rest) = base_path.strip_prefix('/') else {
        return Err(BuildError::InvalidBasePath(base_path.to_owned()));
    };
    let segments: Vec<String> = rest
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect();
    if segments.iter().any(|s| s == "." || s == "..") {
        return Err(BuildError::InvalidBasePath(base_path.to_owned()));
    }
    Ok(segments)
}

impl HateosRouter {
    /// Start building a router mounted at `base_path` (e.g. `/api`).
    #[must_use]
    pub fn builder(base_path: impl Into<String>) -> HateosRouterBuilder {
        HateosRouterBuilder {
            base_path: base_path.into(),
            media_type: MediaType::default(),
            registry: TypeRegistry::default(),
            mappings: Vec::new(),
        }
    }

    /// The normalized base path; empty for a router mounted at `/`.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.shared.base_path
    }

    /// The media type this router reads and writes.
    #[must_use]
    pub fn media_type(&self) -> MediaType {
        self.shared.media_type
    }

    /// The marshalling context, with this router's link injector attached.
    #[must_use]
    pub fn marshall_context(&self) -> &MarshallContext {
        &self.shared.marshall
    }

    /// Route `request` if its path is under the base path.
    #[must_use]
    pub fn route<'r>(&'r self, request: &'r http::Request<Bytes>) -> Option<RoutedRequest<'r>> {
        let segments = normalize_path(request.uri().path());
        let base = &self.shared.base_segments;
        if segments.len() < base.len() || segments[..base.len()] != base[..] {
            return None;
        }
        Some(RoutedRequest {
            router: self,
            request,
            segments: segments[base.len()..].to_vec(),
        })
    }
}

/// A request accepted by a router, ready to run.
#[derive(Debug)]
pub struct RoutedRequest<'r> {
    router: &'r HateosRouter,
    request: &'r http::Request<Bytes>,
    segments: Vec<String>,
}

impl RoutedRequest<'_> {
    /// The decoded segments after the base path.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Run the request to completion. Every failure becomes an error response
    /// in the router's media type.
    #[must_use]
    pub fn handle(&self) -> http::Response<Bytes> {
        let media_type = self.router.shared.media_type;
        match self.dispatch() {
            Ok(response) => {
                debug!(
                    method = %self.request.method(),
                    path = self.request.uri().path(),
                    status = response.status().as_u16(),
                    "dispatched request"
                );
                response
            }
            Err(err) => {
                if err.status.is_server_error() {
                    error!(status = err.status.as_u16(), message = %err.message, "request failed");
                } else {
                    warn!(
                        method = %self.request.method(),
                        path = self.request.uri().path(),
                        status = err.status.as_u16(),
                        message = %err.message,
                        "request rejected"
                    );
                }
                error_to_response(&err, media_type)
            }
        }
    }

    fn dispatch(&self) -> Result<http::Response<Bytes>, HateosError> {
        let shared = &self.router.shared;

        let name = self
            .segments
            .first()
            .map(String::as_str)
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| HateosError::bad_request("Missing resource name"))?;
        let name = ResourceName::new(name)?;
        let relation = self
            .segments
            .get(2)
            .map(String::as_str)
            .filter(|segment| !segment.is_empty());

        let Some(mapping) = shared.mappings.get(&name) else {
            return Err(HateosError::not_found(match relation {
                Some(relation) => format!("resource: {name}, link relation: {relation}"),
                None => format!("resource: {name}"),
            }));
        };

        let context = RequestContext {
            method: HttpMethod::from(self.request.method()),
            resource: name,
            base_path: shared.base_path.clone(),
            media_type: shared.media_type,
            parameters: parse_query(self.request.uri().query().unwrap_or_default()),
            headers: self.request.headers().clone(),
        };
        mapping.dispatch(DispatchRequest {
            request: self.request,
            selection: self.segments.get(1).map_or("", String::as_str),
            relation,
            extra_path: self.segments.get(3..).unwrap_or_default(),
            context,
            marshall: &shared.marshall,
        })
    }
}

/// Several routers tried in order; the first that routes a request wins.
#[derive(Debug, Clone, Default)]
pub struct HateosRouters {
    routers: Vec<HateosRouter>,
}

impl HateosRouters {
    /// Chain `routers` in order.
    #[must_use]
    pub fn new(routers: Vec<HateosRouter>) -> Self {
        Self { routers }
    }

    /// Append a router.
    pub fn push(&mut self, router: HateosRouter) {
        self.routers.push(router);
    }

    /// The first router willing to route `request`.
    #[must_use]
    pub fn route<'r>(&'r self, request: &'r http::Request<Bytes>) -> Option<RoutedRequest<'r>> {
        self.routers.iter().find_map(|router| router.route(request))
    }

    /// Route and run `request`; 404 when no router takes it.
    #[must_use]
    pub fn handle(&self, request: &http::Request<Bytes>) -> http::Response<Bytes> {
        if let Some(routed) = self.route(request) {
            return routed.handle();
        }
        let path = request.uri().path();
        debug!(path, "no router for path");
        self.error_response(&HateosError::not_found(format!("path: {path}")))
    }

    /// Render an error raised outside any router, in the first router's
    /// media type.
    #[must_use]
    pub fn error_response(&self, error: &HateosError) -> http::Response<Bytes> {
        let media_type = self
            .routers
            .first()
            .map(HateosRouter::media_type)
            .unwrap_or_default();
        error_to_response(error, media_type)
    }
}
