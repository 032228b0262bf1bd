//! The marshalling context and the traits values implement to use it.

use std::any::{Any, type_name};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use hateos_model::HateosResource;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{CodecError, Node, TypeRegistry};

/// Rewrites the node of every marshalled [`HateosResource`] that has a link id.
pub trait ObjectPostProcessor: Send + Sync {
    /// Return the node to emit for `value`, whose link id is `link_id`.
    fn post_process(&self, value: &dyn Any, link_id: &str, node: Node) -> Node;
}

/// A value that can be marshalled into a [`Node`].
pub trait Marshall {
    /// Marshall `self`.
    fn marshall(&self, context: &MarshallContext) -> Result<Node, CodecError>;
}

/// A value that can be rebuilt from a [`Node`].
pub trait Unmarshall: Sized {
    /// Rebuild a value from `node`.
    fn unmarshall(node: &Node, context: &MarshallContext) -> Result<Self, CodecError>;
}

/// Shared marshalling state: the type registry and an optional post-processor.
///
/// Cloning is cheap; both parts are behind `Arc`.
#[derive(Clone, Default)]
pub struct MarshallContext {
    registry: Arc<TypeRegistry>,
    post_processor: Option<Arc<dyn ObjectPostProcessor>>,
}

impl fmt::Debug for MarshallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarshallContext")
            .field("registry", &self.registry)
            .field("post_processor", &self.post_processor.is_some())
            .finish()
    }
}

impl MarshallContext {
    /// Create a context over `registry` with no post-processor.
    #[must_use]
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            post_processor: None,
        }
    }

    /// A copy of this context that runs `post_processor` on every resource.
    #[must_use]
    pub fn with_post_processor(&self, post_processor: Arc<dyn ObjectPostProcessor>) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            post_processor: Some(post_processor),
        }
    }

    /// The type registry.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Marshall any [`Marshall`] value.
    pub fn marshall<T: Marshall + ?Sized>(&self, value: &T) -> Result<Node, CodecError> {
        value.marshall(self)
    }

    /// Marshall a plain serde value. No post-processing is applied.
    pub fn marshall_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Node, CodecError> {
        Ok(serde_json::to_value(value)?)
    }

    /// Marshall a resource with serde, then hand it to the post-processor
    /// when the resource has a link id.
    pub fn marshall_resource<R>(&self, resource: &R) -> Result<Node, CodecError>
    where
        R: HateosResource + Serialize,
    {
        let node = serde_json::to_value(resource)?;
        match (&self.post_processor, resource.hateos_link_id()) {
            (Some(post_processor), Some(link_id)) => {
                Ok(post_processor.post_process(resource as &dyn Any, &link_id, node))
            }
            _ => Ok(node),
        }
    }

    /// Marshall each item into a JSON array.
    pub fn marshall_iter<'a, T, It>(&self, items: It) -> Result<Node, CodecError>
    where
        T: Marshall + 'a,
        It: IntoIterator<Item = &'a T>,
    {
        items
            .into_iter()
            .map(|item| item.marshall(self))
            .collect::<Result<Vec<_>, _>>()
            .map(Node::Array)
    }

    /// Marshall a registered value as `{"type": tag, "value": node}`.
    pub fn marshall_with_type<T: Any>(&self, value: &T) -> Result<Node, CodecError> {
        let (tag, marshall) = self
            .registry
            .marshaller_of::<T>()
            .ok_or(CodecError::UnregisteredType(type_name::<T>()))?;
        let node = marshall(value, self)?;
        Ok(serde_json::json!({ "type": tag, "value": node }))
    }

    /// Unmarshall any [`Unmarshall`] value.
    pub fn unmarshall<T: Unmarshall>(&self, node: &Node) -> Result<T, CodecError> {
        T::unmarshall(node, self)
    }

    /// Unmarshall a plain serde value.
    pub fn unmarshall_value<T: DeserializeOwned>(&self, node: &Node) -> Result<T, CodecError> {
        Ok(T::deserialize(node)?)
    }

    /// Rebuild a value marshalled by [`Self::marshall_with_type`]. The caller
    /// downcasts the result.
    pub fn unmarshall_with_type(&self, node: &Node) -> Result<Box<dyn Any + Send + Sync>, CodecError> {
        let tag = node
            .get("type")
            .and_then(Node::as_str)
            .ok_or_else(|| CodecError::Shape("expected an object with a \"type\" string".to_owned()))?;
        let value = node
            .get("value")
            .ok_or_else(|| CodecError::Shape("expected an object with a \"value\"".to_owned()))?;
        let unmarshall = self
            .registry
            .unmarshaller_of(tag)
            .ok_or_else(|| CodecError::UnknownTag(tag.to_owned()))?;
        unmarshall(value, self)
    }
}

impl Marshall for Node {
    fn marshall(&self, _context: &MarshallContext) -> Result<Node, CodecError> {
        Ok(self.clone())
    }
}

impl Unmarshall for Node {
    fn unmarshall(node: &Node, _context: &MarshallContext) -> Result<Self, CodecError> {
        Ok(node.clone())
    }
}

impl<T: Marshall> Marshall for Vec<T> {
    fn marshall(&self, context: &MarshallContext) -> Result<Node, CodecError> {
        context.marshall_iter(self)
    }
}

impl<T: Marshall> Marshall for BTreeSet<T> {
    fn marshall(&self, context: &MarshallContext) -> Result<Node, CodecError> {
        context.marshall_iter(self)
    }
}

/// `null` reads as an empty collection.
impl<T: Unmarshall> Unmarshall for Vec<T> {
    fn unmarshall(node: &Node, context: &MarshallContext) -> Result<Self, CodecError> {
        match node {
            Node::Null => Ok(Vec::new()),
            Node::Array(items) => items.iter().map(|item| T::unmarshall(item, context)).collect(),
            other => Err(CodecError::Shape(format!("expected an array, got {}", kind(other)))),
        }
    }
}

impl<T: Unmarshall + Ord> Unmarshall for BTreeSet<T> {
    fn unmarshall(node: &Node, context: &MarshallContext) -> Result<Self, CodecError> {
        Ok(Vec::<T>::unmarshall(node, context)?.into_iter().collect())
    }
}

fn kind(node: &Node) -> &'static str {
    match node {
        Node::Null => "null",
        Node::Bool(_) => "a boolean",
        Node::Number(_) => "a number",
        Node::String(_) => "a string",
        Node::Array(_) => "an array",
        Node::Object(_) => "an object",
    }
}
