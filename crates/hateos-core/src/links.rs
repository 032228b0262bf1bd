//! Hypermedia link injection.
//!
//! For every marshalled resource whose type is mapped by the router, the
//! injector appends one link per bound `(relation, method)`:
//!
//! ```json
//! {
//!   "id": 123,
//!   "_links": [
//!     {"href": "/api/notes/7b/contents", "method": "GET", "rel": "contents", "type": "application/json"},
//!     {"href": "/api/notes/7b", "method": "POST", "rel": "self", "type": "application/json"}
//!   ]
//! }
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;

use hateos_codec::{MediaType, Node, ObjectPostProcessor};
use hateos_model::{HttpMethod, LinkRelation, ResourceName};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;

/// The member name links are written under.
pub const LINKS_MEMBER: &str = "_links";

/// Characters escaped in the link id segment of an href.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Target URL path.
    pub href: String,
    /// HTTP method to use.
    pub method: String,
    /// Link relation.
    pub rel: String,
    /// Media type of the target.
    #[serde(rename = "type")]
    pub media_type: String,
}

#[derive(Debug)]
struct LinkedResource {
    name: ResourceName,
    bindings: Vec<(LinkRelation, HttpMethod)>,
}

/// Adds `_links` to marshalled resources. Built once per router; pure.
#[derive(Debug, Default)]
pub struct LinkInjector {
    base_path: String,
    media_type: MediaType,
    resources: HashMap<TypeId, LinkedResource>,
}

impl LinkInjector {
    /// An injector for a router at `base_path` (e.g. `/api`, or empty for `/`).
    #[must_use]
    pub fn new(base_path: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            base_path: base_path.into(),
            media_type,
            resources: HashMap::new(),
        }
    }

    /// Register the bindings of the mapping whose resource type is `type_id`.
    pub fn insert(
        &mut self,
        type_id: TypeId,
        name: ResourceName,
        mut bindings: Vec<(LinkRelation, HttpMethod)>,
    ) {
        bindings.sort();
        self.resources
            .insert(type_id, LinkedResource { name, bindings });
    }

    /// The links for a resource of type `type_id` with `link_id`, sorted by
    /// relation then method. `None` when the type is not mapped.
    #[must_use]
    pub fn links(&self, type_id: TypeId, link_id: &str) -> Option<Vec<Link>> {
        let resource = self.resources.get(&type_id)?;
        let base_url = format!(
            "{}/{}/{}",
            self.base_path,
            resource.name,
            utf8_percent_encode(link_id, SEGMENT)
        );
        let links = resource
            .bindings
            .iter()
            .map(|(relation, method)| Link {
                href: if relation.is_self() {
                    base_url.clone()
                } else {
                    format!("{base_url}/{}", utf8_percent_encode(relation.as_str(), SEGMENT))
                },
                method: method.to_string(),
                rel: relation.to_string(),
                media_type: self.media_type.essence().to_owned(),
            })
            .collect();
        Some(links)
    }
}

impl ObjectPostProcessor for LinkInjector {
    fn post_process(&self, value: &dyn Any, link_id: &str, mut node: Node) -> Node {
        let Some(links) = self.links(value.type_id(), link_id) else {
            return node;
        };
        if let Node::Object(members) = &mut node {
            let links = links
                .into_iter()
                .map(|link| {
                    serde_json::json!({
                        "href": link.href,
                        "method": link.method,
                        "rel": link.rel,
                        "type": link.media_type,
                    })
                })
                .collect();
            members.insert(LINKS_MEMBER.to_owned(), Node::Array(links));
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Note;

    fn injector() -> LinkInjector {
        let mut injector = LinkInjector::new("/api", MediaType::Json);
        injector.insert(
            TypeId::of::<Note>(),
            ResourceName::new("resource1").unwrap(),
            vec![
                (LinkRelation::SELF, HttpMethod::POST),
                (LinkRelation::CONTENTS, HttpMethod::POST),
                (LinkRelation::CONTENTS, HttpMethod::GET),
            ],
        );
        injector
    }

    #[test]
    fn test_should_inject_sorted_links() {
        let node = injector().post_process(&Note, "7b", json!({"id": 123}));
        assert_eq!(
            node,
            json!({
                "id": 123,
                "_links": [
                    {"href": "/api/resource1/7b/contents", "method": "GET", "rel": "contents", "type": "application/json"},
                    {"href": "/api/resource1/7b/contents", "method": "POST", "rel": "contents", "type": "application/json"},
                    {"href": "/api/resource1/7b", "method": "POST", "rel": "self", "type": "application/json"},
                ]
            })
        );
    }

    #[test]
    fn test_should_pass_through_unmapped_types_and_scalars() {
        let injector = injector();
        assert_eq!(injector.post_process(&1_u8, "1", json!({"a": 1})), json!({"a": 1}));
        assert_eq!(injector.post_process(&Note, "1", json!("text")), json!("text"));
    }

    #[test]
    fn test_should_escape_link_id() {
        let links = injector().links(TypeId::of::<Note>(), "a b/c").unwrap();
        assert_eq!(links[2].href, "/api/resource1/a%20b%2Fc");
    }

    #[test]
    fn test_should_omit_base_path_at_root() {
        let mut injector = LinkInjector::new("", MediaType::Xml);
        injector.insert(
            TypeId::of::<Note>(),
            ResourceName::new("notes").unwrap(),
            vec![(LinkRelation::SELF, HttpMethod::GET)],
        );
        let links = injector.links(TypeId::of::<Note>(), "1").unwrap();
        assert_eq!(links[0].href, "/notes/1");
        assert_eq!(links[0].media_type, "application/xml");
    }
}
