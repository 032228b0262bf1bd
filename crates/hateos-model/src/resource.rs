//! The resource identity contract.

use std::any::Any;
use std::fmt;

/// A value addressable as `{base}/{resource name}/{link id}`.
///
/// Marshalling a `HateosResource` gives the router a chance to append
/// hypermedia links describing what can be done with it next. A resource
/// without an id (e.g. one that has not been created yet) gets no links.
pub trait HateosResource: Any + Send + Sync {
    /// The id type, usually the same id the mapping's selection parser emits.
    type Id: fmt::Display;

    /// The id of this resource, if it has one.
    fn id(&self) -> Option<Self::Id>;

    /// The id as it appears in link hrefs. Defaults to the id's `Display`.
    fn hateos_link_id(&self) -> Option<String> {
        self.id().map(|id| id.to_string())
    }
}
