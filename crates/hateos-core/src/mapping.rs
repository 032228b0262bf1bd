//! Persistent resource mappings.
//!
//! A [`HateosResourceMapping`] binds a resource name to a selection parser and
//! a handler table. Every `set_*` call returns a new mapping that shares the
//! untouched entries with the old one; re-binding a key to the handler it
//! already has returns the very same mapping:
//!
//! ```ignore
//! let mapping = HateosResourceMapping::<u64, Note, Vec<Note>, Note>::with(name, parser)
//!     .set_hateos_resource_handler(LinkRelation::SELF, HttpMethod::GET, notes.clone());
//! let again = mapping.set_hateos_resource_handler(LinkRelation::SELF, HttpMethod::GET, notes);
//! assert!(again.ptr_eq(&mapping));
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use hateos_model::{HttpMethod, LinkRelation, ResourceName, Selection, SelectionError};

use crate::handler::{HateosHttpEntityHandler, HateosHttpHandler, HateosResourceHandler, RequestContext};

/// Turns the raw selection segment into a [`Selection`].
pub type SelectionParser<I> =
    Arc<dyn Fn(&str, &RequestContext) -> Result<Selection<I>, SelectionError> + Send + Sync>;

/// The handler bound to one `(relation, method)`.
pub enum MappingHandler<I, V, C> {
    /// Typed handler.
    Resource(Arc<dyn HateosResourceHandler<I, V, C>>),
    /// Byte-level handler.
    Entity(Arc<dyn HateosHttpEntityHandler<I>>),
}

impl<I, V, C> MappingHandler<I, V, C> {
    /// Whether both bindings point at the same handler instance.
    #[must_use]
    pub fn same_handler(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Resource(a), Self::Resource(b)) => same_instance(a, b),
            (Self::Entity(a), Self::Entity(b)) => same_instance(a, b),
            _ => false,
        }
    }
}

impl<I, V, C> Clone for MappingHandler<I, V, C> {
    fn clone(&self) -> Self {
        match self {
            Self::Resource(handler) => Self::Resource(Arc::clone(handler)),
            Self::Entity(handler) => Self::Entity(Arc::clone(handler)),
        }
    }
}

impl<I, V, C> fmt::Debug for MappingHandler<I, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(_) => f.write_str("Resource(..)"),
            Self::Entity(_) => f.write_str("Entity(..)"),
        }
    }
}

/// Compares data pointers only; vtable pointers may differ across codegen units.
fn same_instance<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

pub(crate) struct MappingTable<I, V, C> {
    pub(crate) name: ResourceName,
    pub(crate) parser: SelectionParser<I>,
    pub(crate) handlers: HashMap<(LinkRelation, HttpMethod), MappingHandler<I, V, C>>,
    pub(crate) http_handlers: HashMap<String, Arc<dyn HateosHttpHandler<I>>>,
}

impl<I, V, C> Clone for MappingTable<I, V, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            parser: Arc::clone(&self.parser),
            handlers: self.handlers.clone(),
            http_handlers: self.http_handlers.clone(),
        }
    }
}

/// A resource name with its selection parser and handler tables.
///
/// `I` is the id type, `V` a single value, `C` a collection and `R` the
/// resource type whose marshalled form receives this mapping's links.
pub struct HateosResourceMapping<I, V, C, R> {
    pub(crate) table: Arc<MappingTable<I, V, C>>,
    _resource: PhantomData<fn() -> R>,
}

impl<I, V, C, R> Clone for HateosResourceMapping<I, V, C, R> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            _resource: PhantomData,
        }
    }
}

impl<I, V, C, R> fmt::Debug for HateosResourceMapping<I, V, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .table
            .handlers
            .keys()
            .map(|(relation, method)| format!("{method} {relation}"))
            .collect();
        keys.sort();
        let mut paths: Vec<&String> = self.table.http_handlers.keys().collect();
        paths.sort();
        f.debug_struct("HateosResourceMapping")
            .field("name", &self.table.name)
            .field("handlers", &keys)
            .field("http_handlers", &paths)
            .finish_non_exhaustive()
    }
}

impl<I, V, C, R> HateosResourceMapping<I, V, C, R> {
    /// A mapping with no handlers.
    pub fn with<P>(name: ResourceName, parser: P) -> Self
    where
        P: Fn(&str, &RequestContext) -> Result<Selection<I>, SelectionError> + Send + Sync + 'static,
    {
        Self {
            table: Arc::new(MappingTable {
                name,
                parser: Arc::new(parser),
                handlers: HashMap::new(),
                http_handlers: HashMap::new(),
            }),
            _resource: PhantomData,
        }
    }

    /// Bind a typed handler to `(relation, method)`.
    #[must_use]
    pub fn set_hateos_resource_handler(
        &self,
        relation: LinkRelation,
        method: HttpMethod,
        handler: Arc<dyn HateosResourceHandler<I, V, C>>,
    ) -> Self {
        self.set_handler(relation, method, MappingHandler::Resource(handler))
    }

    /// Bind a byte-level handler to `(relation, method)`.
    #[must_use]
    pub fn set_hateos_http_entity_handler(
        &self,
        relation: LinkRelation,
        method: HttpMethod,
        handler: Arc<dyn HateosHttpEntityHandler<I>>,
    ) -> Self {
        self.set_handler(relation, method, MappingHandler::Entity(handler))
    }

    /// Bind a raw HTTP handler to the path name in the relation position.
    #[must_use]
    pub fn set_hateos_http_handler(
        &self,
        path_name: impl Into<String>,
        handler: Arc<dyn HateosHttpHandler<I>>,
    ) -> Self {
        let path_name = path_name.into();
        if let Some(existing) = self.table.http_handlers.get(&path_name) {
            if same_instance(existing, &handler) {
                return self.clone();
            }
        }
        let mut table = (*self.table).clone();
        table.http_handlers.insert(path_name, handler);
        self.replace(table)
    }

    fn set_handler(
        &self,
        relation: LinkRelation,
        method: HttpMethod,
        handler: MappingHandler<I, V, C>,
    ) -> Self {
        let key = (relation, method);
        if let Some(existing) = self.table.handlers.get(&key) {
            if existing.same_handler(&handler) {
                return self.clone();
            }
        }
        let mut table = (*self.table).clone();
        table.handlers.insert(key, handler);
        self.replace(table)
    }

    fn replace(&self, table: MappingTable<I, V, C>) -> Self {
        Self {
            table: Arc::new(table),
            _resource: PhantomData,
        }
    }

    /// The resource name.
    #[must_use]
    pub fn name(&self) -> &ResourceName {
        &self.table.name
    }

    /// Parse a selection segment with this mapping's parser.
    pub fn parse_selection(
        &self,
        segment: &str,
        context: &RequestContext,
    ) -> Result<Selection<I>, SelectionError> {
        (self.table.parser)(segment, context)
    }

    /// The handler bound to `(relation, method)`.
    #[must_use]
    pub fn handler(
        &self,
        relation: &LinkRelation,
        method: &HttpMethod,
    ) -> Option<MappingHandler<I, V, C>> {
        self.table
            .handlers
            .get(&(relation.clone(), method.clone()))
            .cloned()
    }

    /// The raw HTTP handler registered under `path_name`.
    #[must_use]
    pub fn http_handler(&self, path_name: &str) -> Option<Arc<dyn HateosHttpHandler<I>>> {
        self.table.http_handlers.get(path_name).cloned()
    }

    /// Methods bound for `relation`, ascending.
    #[must_use]
    pub fn allowed_methods(&self, relation: &LinkRelation) -> BTreeSet<HttpMethod> {
        self.table.allowed_methods(relation)
    }

    /// Every bound `(relation, method)`, sorted by relation then method.
    #[must_use]
    pub fn bindings(&self) -> Vec<(LinkRelation, HttpMethod)> {
        self.table.bindings()
    }

    /// Whether both handles share one table allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
    }
}

impl<I, V, C> MappingTable<I, V, C> {
    pub(crate) fn allowed_methods(&self, relation: &LinkRelation) -> BTreeSet<HttpMethod> {
        self.handlers
            .keys()
            .filter(|(r, _)| r == relation)
            .map(|(_, method)| method.clone())
            .collect()
    }

    pub(crate) fn bindings(&self) -> Vec<(LinkRelation, HttpMethod)> {
        let mut bindings: Vec<_> = self.handlers.keys().cloned().collect();
        bindings.sort();
        bindings
    }
}

#[cfg(test)]
mod tests {
    use hateos_codec::MediaType;
    use hateos_model::SelectionSyntax;

    use super::*;

    struct Notes;

    impl HateosResourceHandler<u64, String, Vec<String>> for Notes {}

    struct Export;

    impl HateosHttpHandler<u64> for Export {
        fn handle(
            &self,
            _selection: &Selection<u64>,
            _extra_path: &[String],
            _request: &http::Request<bytes::Bytes>,
            _context: &RequestContext,
        ) -> http::Response<bytes::Bytes> {
            http::Response::new(bytes::Bytes::new())
        }
    }

    type Mapping = HateosResourceMapping<u64, String, Vec<String>, String>;

    fn mapping() -> Mapping {
        Mapping::with(ResourceName::new("notes").unwrap(), |segment, _| {
            SelectionSyntax::default().parse(segment, |text| u64::from_str_radix(text, 16).ok())
        })
    }

    #[test]
    fn test_should_return_same_mapping_for_identical_binding() {
        let handler: Arc<dyn HateosResourceHandler<u64, String, Vec<String>>> = Arc::new(Notes);
        let first = mapping().set_hateos_resource_handler(
            LinkRelation::SELF,
            HttpMethod::GET,
            Arc::clone(&handler),
        );
        let second =
            first.set_hateos_resource_handler(LinkRelation::SELF, HttpMethod::GET, handler);
        assert!(second.ptr_eq(&first));
    }

    #[test]
    fn test_should_copy_on_write_for_new_binding() {
        let handler: Arc<dyn HateosResourceHandler<u64, String, Vec<String>>> = Arc::new(Notes);
        let first = mapping().set_hateos_resource_handler(
            LinkRelation::SELF,
            HttpMethod::GET,
            Arc::clone(&handler),
        );
        let second =
            first.set_hateos_resource_handler(LinkRelation::SELF, HttpMethod::POST, handler);

        assert!(!second.ptr_eq(&first));
        assert_eq!(first.allowed_methods(&LinkRelation::SELF).len(), 1);
        assert_eq!(second.allowed_methods(&LinkRelation::SELF).len(), 2);
    }

    #[test]
    fn test_should_replace_binding_with_other_instance() {
        let first =
            mapping().set_hateos_resource_handler(LinkRelation::SELF, HttpMethod::GET, Arc::new(Notes));
        let second =
            first.set_hateos_resource_handler(LinkRelation::SELF, HttpMethod::GET, Arc::new(Notes));
        assert!(!second.ptr_eq(&first));
        assert_eq!(second.bindings(), first.bindings());
    }

    #[test]
    fn test_should_share_identical_http_handler() {
        let export: Arc<dyn HateosHttpHandler<u64>> = Arc::new(Export);
        let first = mapping().set_hateos_http_handler("export", Arc::clone(&export));
        let second = first.set_hateos_http_handler("export", export);
        assert!(second.ptr_eq(&first));
        assert!(second.http_handler("export").is_some());
        assert!(second.http_handler("import").is_none());
    }

    #[test]
    fn test_should_sort_bindings_and_allowed_methods() {
        let handler: Arc<dyn HateosResourceHandler<u64, String, Vec<String>>> = Arc::new(Notes);
        let mapping = mapping()
            .set_hateos_resource_handler(LinkRelation::SELF, HttpMethod::PUT, Arc::clone(&handler))
            .set_hateos_resource_handler(LinkRelation::CONTENTS, HttpMethod::POST, Arc::clone(&handler))
            .set_hateos_resource_handler(LinkRelation::CONTENTS, HttpMethod::GET, Arc::clone(&handler))
            .set_hateos_resource_handler(LinkRelation::SELF, HttpMethod::DELETE, handler);

        assert_eq!(
            mapping.bindings(),
            vec![
                (LinkRelation::CONTENTS, HttpMethod::GET),
                (LinkRelation::CONTENTS, HttpMethod::POST),
                (LinkRelation::SELF, HttpMethod::DELETE),
                (LinkRelation::SELF, HttpMethod::PUT),
            ]
        );
        let allowed: Vec<_> = mapping.allowed_methods(&LinkRelation::CONTENTS).into_iter().collect();
        assert_eq!(allowed, vec![HttpMethod::GET, HttpMethod::POST]);
        assert!(mapping.allowed_methods(&LinkRelation::ABOUT).is_empty());
        assert!(mapping.handler(&LinkRelation::SELF, &HttpMethod::GET).is_none());
        assert!(mapping.handler(&LinkRelation::SELF, &HttpMethod::PUT).is_some());
    }

    #[test]
    fn test_should_parse_selection_with_mapping_parser() {
        let context = RequestContext::new(
            HttpMethod::GET,
            ResourceName::new("notes").unwrap(),
            MediaType::Json,
        );
        assert_eq!(mapping().parse_selection("7b", &context).unwrap(), Selection::One(0x7b));
        assert_eq!(
            mapping().parse_selection("zz", &context).unwrap_err().message(),
            "Invalid id \"zz\""
        );
    }
}
