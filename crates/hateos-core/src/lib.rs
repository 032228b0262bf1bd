//! Dispatch engine for hypermedia (HATEOAS) resources.
//!
//! A [`HateosRouter`] owns a base path, one media type and a set of
//! [`HateosResourceMapping`]s. For every request under its base path it:
//!
//! 1. splits the path into `{resource}/{selection}/{relation}/{extra...}`;
//! 2. resolves the mapping and parses the selection with the mapping's parser;
//! 3. looks up the handler registered for `(relation, method)`;
//! 4. validates `Content-Length`, `Accept` and `Content-Type`;
//! 5. unmarshalls the body, calls the handler and marshalls the result,
//!    appending `_links` to every resource that has an id.
//!
//! The router is immutable once built and is shared across tasks.

pub mod config;
mod dispatch;
pub mod error;
pub mod handler;
pub mod links;
pub mod mapping;
pub mod negotiate;
pub mod response;
pub mod router;

pub use config::HateosConfig;
pub use error::{BuildError, ConfigError, HandlerError};
pub use handler::{
    HandlerResult, HateosContext, HateosHttpEntityHandler, HateosHttpHandler,
    HateosResourceHandler, HttpEntity, RequestContext,
};
pub use links::{Link, LinkInjector};
pub use mapping::{HateosResourceMapping, MappingHandler};
pub use router::{HateosRouter, HateosRouterBuilder, HateosRouters, RoutedRequest};
