//! Explicit tag registry for polymorphic values.
//!
//! A registered type is written as `{"type": "<tag>", "value": <node>}` and
//! read back by looking the tag up. There is no global registry: build one at
//! startup and hand it to [`MarshallContext::new`].

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use crate::{CodecError, Marshall, MarshallContext, Node, Unmarshall};

/// Marshalls a type-erased value of the registered type.
pub type MarshallFn = fn(&dyn Any, &MarshallContext) -> Result<Node, CodecError>;

/// Rebuilds a value of the registered type.
pub type UnmarshallFn =
    fn(&Node, &MarshallContext) -> Result<Box<dyn Any + Send + Sync>, CodecError>;

#[derive(Debug, Clone)]
struct Entry {
    type_name: &'static str,
    marshall: MarshallFn,
    unmarshall: UnmarshallFn,
}

/// Tag to (marshall, unmarshall) table, with a reverse index by Rust type.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    by_tag: HashMap<String, Entry>,
    by_type: HashMap<TypeId, String>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `tag`. A tag or type can only be registered once.
    pub fn register<T>(mut self, tag: impl Into<String>) -> Result<Self, CodecError>
    where
        T: Marshall + Unmarshall + Send + Sync + 'static,
    {
        let tag = tag.into();
        if self.by_tag.contains_key(&tag) || self.by_type.contains_key(&TypeId::of::<T>()) {
            return Err(CodecError::DuplicateTag(tag));
        }
        tracing::debug!(tag = %tag, type_name = type_name::<T>(), "registered marshall type");
        self.by_tag.insert(
            tag.clone(),
            Entry {
                type_name: type_name::<T>(),
                marshall: marshall_erased::<T>,
                unmarshall: unmarshall_erased::<T>,
            },
        );
        self.by_type.insert(TypeId::of::<T>(), tag);
        Ok(self)
    }

    /// The tag `T` was registered under.
    #[must_use]
    pub fn tag_of<T: Any>(&self) -> Option<&str> {
        self.by_type.get(&TypeId::of::<T>()).map(String::as_str)
    }

    /// The Rust type name registered under `tag`.
    #[must_use]
    pub fn type_name_of(&self, tag: &str) -> Option<&'static str> {
        self.by_tag.get(tag).map(|entry| entry.type_name)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    pub(crate) fn marshaller_of<T: Any>(&self) -> Option<(&str, MarshallFn)> {
        let tag = self.by_type.get(&TypeId::of::<T>())?;
        let entry = self.by_tag.get(tag)?;
        Some((tag.as_str(), entry.marshall))
    }

    pub(crate) fn unmarshaller_of(&self, tag: &str) -> Option<UnmarshallFn> {
        self.by_tag.get(tag).map(|entry| entry.unmarshall)
    }
}

fn marshall_erased<T: Marshall + 'static>(
    value: &dyn Any,
    context: &MarshallContext,
) -> Result<Node, CodecError> {
    value
        .downcast_ref::<T>()
        .ok_or(CodecError::UnregisteredType(type_name::<T>()))?
        .marshall(context)
}

fn unmarshall_erased<T: Unmarshall + Send + Sync + 'static>(
    node: &Node,
    context: &MarshallContext,
) -> Result<Box<dyn Any + Send + Sync>, CodecError> {
    Ok(Box::new(T::unmarshall(node, context)?))
}
