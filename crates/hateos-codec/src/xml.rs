//! XML text form of a [`Node`].
//!
//! The document element is named after the resource. Object members become
//! child elements, array items become repeated `<item>` elements and scalars
//! become text. A `type` attribute keeps the mapping lossless where text alone
//! would be ambiguous:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <notes type="object">
//!   <id>123</id>
//!   <title type="string">42</title>
//!   <done>false</done>
//!   <due type="null"/>
//!   <tags type="array"><item>home</item></tags>
//! </notes>
//! ```
//!
//! Without a `type` attribute an element with children reads as an object,
//! `true`/`false` as a boolean, a JSON number as a number and anything else as
//! a string, so hand-written documents need no attributes at all.

use std::io::{self, Write};

use quick_xml::{Reader, Writer};
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use serde_json::Map;

use crate::{CodecError, Node};

const TYPE_ATTR: &str = "type";
const ITEM: &str = "item";

/// Render `node` as an XML document whose root element is `root`.
pub fn to_text(root: &str, node: &Node) -> Result<String, CodecError> {
    let mut buf = Vec::with_capacity(256);
    write_document(&mut buf, root, node).map_err(|e| CodecError::Xml(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| CodecError::Xml(e.to_string()))
}

fn write_document(buf: &mut Vec<u8>, root: &str, node: &Node) -> io::Result<()> {
    let mut writer = Writer::new(buf);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_node(&mut writer, root, node)
}

fn write_node<W: Write>(writer: &mut Writer<W>, tag: &str, node: &Node) -> io::Result<()> {
    if !is_element_name(tag) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid element name \"{tag}\""),
        ));
    }
    let element = writer.create_element(tag);
    match node {
        Node::Null => {
            element.with_attribute((TYPE_ATTR, "null")).write_empty()?;
        }
        Node::Bool(value) => {
            let text = if *value { "true" } else { "false" };
            element.write_text_content(BytesText::new(text))?;
        }
        Node::Number(value) => {
            element.write_text_content(BytesText::new(&value.to_string()))?;
        }
        Node::String(text) => {
            let element = if infer_scalar(text).is_some() {
                element.with_attribute((TYPE_ATTR, "string"))
            } else {
                element
            };
            element.write_text_content(BytesText::new(text))?;
        }
        Node::Array(items) => {
            element
                .with_attribute((TYPE_ATTR, "array"))
                .write_inner_content(|w| {
                    for item in items {
                        write_node(w, ITEM, item)?;
                    }
                    Ok(())
                })?;
        }
        Node::Object(members) => {
            element
                .with_attribute((TYPE_ATTR, "object"))
                .write_inner_content(|w| {
                    for (key, value) in members {
                        write_node(w, key, value)?;
                    }
                    Ok(())
                })?;
        }
    }
    Ok(())
}

fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !name.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("xml"))
}

/// The typed value `text` reads as when no `type` attribute is present.
fn infer_scalar(text: &str) -> Option<Node> {
    match text {
        "true" => return Some(Node::Bool(true)),
        "false" => return Some(Node::Bool(false)),
        _ => {}
    }
    if text.trim() != text {
        return None;
    }
    serde_json::from_str::<serde_json::Number>(text)
        .ok()
        .map(Node::Number)
}

/// Deepest element nesting [`parse`] accepts, the same limit `serde_json`
/// applies to JSON text.
pub const MAX_DEPTH: usize = 128;

/// Parse an XML document into a node. The root element name is ignored.
pub fn parse(text: &str) -> Result<Node, CodecError> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let declared = declared_type(&e)?;
                return read_element(&mut reader, declared, 1);
            }
            Event::Empty(e) => return empty_element(declared_type(&e)?),
            Event::Eof => return Err(CodecError::Xml("missing root element".to_owned())),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declared {
    Infer,
    String,
    Number,
    Boolean,
    Null,
    Array,
    Object,
}

fn declared_type(start: &BytesStart<'_>) -> Result<Declared, CodecError> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_ref() != TYPE_ATTR.as_bytes() {
            continue;
        }
        return match &*attr.value {
            b"string" => Ok(Declared::String),
            b"number" => Ok(Declared::Number),
            b"boolean" => Ok(Declared::Boolean),
            b"null" => Ok(Declared::Null),
            b"array" => Ok(Declared::Array),
            b"object" => Ok(Declared::Object),
            other => Err(CodecError::Xml(format!(
                "unknown type attribute \"{}\"",
                String::from_utf8_lossy(other)
            ))),
        };
    }
    Ok(Declared::Infer)
}

fn element_name(start: &BytesStart<'_>) -> Result<String, CodecError> {
    let name = start.name();
    std::str::from_utf8(name.as_ref())
        .map(str::to_owned)
        .map_err(|e| CodecError::Xml(e.to_string()))
}

fn read_element(
    reader: &mut Reader<&[u8]>,
    declared: Declared,
    depth: usize,
) -> Result<Node, CodecError> {
    let mut text = String::new();
    let mut children: Vec<(String, Node)> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth >= MAX_DEPTH {
                    return Err(CodecError::Xml("nesting too deep".to_owned()));
                }
                let name = element_name(&e)?;
                let child = read_element(reader, declared_type(&e)?, depth + 1)?;
                children.push((name, child));
            }
            Event::Empty(e) => {
                let name = element_name(&e)?;
                children.push((name, empty_element(declared_type(&e)?)?));
            }
            Event::Text(e) => {
                let decoded = e.decode().map_err(|e| CodecError::Xml(e.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|e| CodecError::Xml(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(e) => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::GeneralRef(e) => {
                let name = e.decode().map_err(|e| CodecError::Xml(e.to_string()))?;
                text.push_str(&resolve_reference(&name)?);
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(CodecError::Xml("unexpected end of document".to_owned()));
            }
            _ => {}
        }
    }

    build_node(declared, text, children)
}

fn resolve_reference(name: &str) -> Result<String, CodecError> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        return value
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| CodecError::Xml(format!("invalid character reference \"&{name};\"")));
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map(str::to_owned)
        .ok_or_else(|| CodecError::Xml(format!("unknown entity \"&{name};\"")))
}

fn empty_element(declared: Declared) -> Result<Node, CodecError> {
    build_node(declared, String::new(), Vec::new())
}

fn build_node(
    declared: Declared,
    text: String,
    children: Vec<(String, Node)>,
) -> Result<Node, CodecError> {
    match declared {
        Declared::Null => Ok(Node::Null),
        Declared::Array => Ok(Node::Array(
            children.into_iter().map(|(_, child)| child).collect(),
        )),
        Declared::Object => Ok(object(children)),
        Declared::Infer if !children.is_empty() => Ok(object(children)),
        Declared::Infer => Ok(infer_scalar(&text).unwrap_or(Node::String(text))),
        Declared::String => Ok(Node::String(text)),
        Declared::Number => serde_json::from_str::<serde_json::Number>(text.trim())
            .map(Node::Number)
            .map_err(|_| CodecError::Xml(format!("invalid number \"{text}\""))),
        Declared::Boolean => match text.trim() {
            "true" => Ok(Node::Bool(true)),
            "false" => Ok(Node::Bool(false)),
            _ => Err(CodecError::Xml(format!("invalid boolean \"{text}\""))),
        },
    }
}

fn object(children: Vec<(String, Node)>) -> Node {
    let mut members = Map::new();
    for (name, child) in children {
        members.insert(name, child);
    }
    Node::Object(members)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_write_declaration_and_root() {
        let xml = to_text("notes", &json!({"id": 123, "title": "hello"})).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<notes type=\"object\">"));
        assert!(xml.contains("<id>123</id>"));
        assert!(xml.contains("<title>hello</title>"));
    }

    #[test]
    fn test_should_mark_ambiguous_strings() {
        let xml = to_text("v", &json!({"code": "42", "flag": "true", "word": "null"})).unwrap();
        assert!(xml.contains("<code type=\"string\">42</code>"));
        assert!(xml.contains("<flag type=\"string\">true</flag>"));
        assert!(xml.contains("<word>null</word>"));
    }

    #[test]
    fn test_should_escape_special_characters() {
        let xml = to_text("v", &json!({"text": "a < b & c"})).unwrap();
        assert!(xml.contains("a &lt; b &amp; c"));
        assert_eq!(parse(&xml).unwrap(), json!({"text": "a < b & c"}));
    }

    #[test]
    fn test_should_preserve_every_node_kind() {
        let node = json!({
            "id": 7,
            "ratio": 0.5,
            "done": false,
            "due": null,
            "title": "",
            "code": "007",
            "tags": ["a", 1, [], {}],
            "nested": {"inner": {"deep": "x"}},
        });
        let xml = to_text("notes", &node).unwrap();
        assert_eq!(parse(&xml).unwrap(), node);
    }

    #[test]
    fn test_should_infer_types_without_attributes() {
        let xml = r"
            <notes>
                <id>123</id>
                <done>true</done>
                <title> spaced </title>
                <meta><owner>ann</owner></meta>
            </notes>";
        assert_eq!(
            parse(xml).unwrap(),
            json!({
                "id": 123,
                "done": true,
                "title": " spaced ",
                "meta": {"owner": "ann"},
            })
        );
    }

    #[test]
    fn test_should_resolve_character_references() {
        let xml = "<v><a>x&#65;&#x42;&lt;</a></v>";
        assert_eq!(parse(xml).unwrap(), json!({"a": "xAB<"}));
    }

    #[test]
    fn test_should_reject_malformed_documents() {
        assert!(parse("").is_err());
        assert!(parse("<notes><id>1</id>").is_err());
        assert!(parse("<v type=\"wat\"/>").is_err());
        assert!(parse("<v type=\"number\">abc</v>").is_err());
    }

    fn nested(depth: usize) -> String {
        format!("{}x{}", "<a>".repeat(depth), "</a>".repeat(depth))
    }

    #[test]
    fn test_should_limit_nesting_depth() {
        assert!(parse(&nested(MAX_DEPTH)).is_ok());

        let err = parse(&nested(MAX_DEPTH + 1)).unwrap_err();
        assert_eq!(err.to_string(), "nesting too deep");

        let err = parse(&nested(100_000)).unwrap_err();
        assert_eq!(err.to_string(), "nesting too deep");
    }

    #[test]
    fn test_should_reject_invalid_element_names() {
        assert!(to_text("v", &json!({"a b": 1})).is_err());
        assert!(to_text("v", &json!({"1st": 1})).is_err());
    }
}
