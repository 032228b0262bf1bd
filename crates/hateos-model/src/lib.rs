//! Value types shared by the hypermedia dispatch engine.
//!
//! Everything in this crate is an immutable value object created on demand:
//!
//! - [`ResourceName`]: the first path segment after the router base path
//! - [`LinkRelation`]: `self`, `contents`, ... or an absolute URL relation
//! - [`HttpMethod`]: an ordered wrapper around [`http::Method`]
//! - [`Selection`]: the parsed id segment (none, one, all, range, list)
//! - [`HateosResource`]: the identity contract used for link generation
//! - [`HateosError`]: an error that already knows its HTTP status

mod error;
mod method;
mod name;
mod relation;
mod resource;
mod selection;

pub use error::{HateosError, ModelError};
pub use method::HttpMethod;
pub use name::ResourceName;
pub use relation::LinkRelation;
pub use resource::HateosResource;
pub use selection::{Selection, SelectionError, SelectionRange, SelectionSyntax};
