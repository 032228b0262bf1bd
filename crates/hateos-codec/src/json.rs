//! JSON text form of a [`Node`].

use crate::{CodecError, Node};

/// Render a node as compact JSON text.
pub fn to_text(node: &Node) -> Result<String, CodecError> {
    Ok(serde_json::to_string(node)?)
}

/// Parse JSON text into a node.
pub fn parse(text: &str) -> Result<Node, CodecError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_render_compact_json() {
        let text = to_text(&json!({"id": 1, "tags": ["a"]})).unwrap();
        assert_eq!(text, r#"{"id":1,"tags":["a"]}"#);
    }

    #[test]
    fn test_should_report_parser_position() {
        let err = parse("{\"id\": ").unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
        assert!(err.to_string().contains("line 1"), "{err}");
    }
}
