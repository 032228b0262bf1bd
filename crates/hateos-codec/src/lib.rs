//! Marshalling for the hypermedia dispatch engine.
//!
//! Values are marshalled into a [`Node`] tree through a [`MarshallContext`],
//! which carries an explicit [`TypeRegistry`] for polymorphic values and an
//! optional [`ObjectPostProcessor`] that may rewrite every marshalled resource
//! (the router uses it to inject `_links`). A [`MediaType`] turns nodes into
//! wire text and back:
//!
//! - [`json`]: `application/json` via `serde_json`.
//! - [`xml`]: `application/xml` via `quick-xml`.

pub mod context;
pub mod error;
pub mod json;
pub mod media;
pub mod registry;
pub mod xml;

pub use context::{Marshall, MarshallContext, ObjectPostProcessor, Unmarshall};
pub use error::CodecError;
pub use media::MediaType;
pub use registry::TypeRegistry;

/// The structured tree every value is marshalled into.
pub type Node = serde_json::Value;
