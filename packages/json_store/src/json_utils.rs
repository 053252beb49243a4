use serde_json::value::Value as JsonValue;

use nodetree_core::{Node, StoreError, Structure, StructureId};

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Decode a structure from JSON already parsed into a value.
///
/// Only an array (array root) or an object with a `tag` (object root) is a
/// structure; anything else is reported with what was found instead.
pub fn structure_from_value(value: JsonValue) -> Result<Structure, String> {
    match &value {
        JsonValue::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                node_from_value(item.clone()).map_err(|e| format!("node {}: {}", index, e))?;
            }
            serde_json::from_value(value).map_err(|e| e.to_string())
        }
        JsonValue::Object(map) if map.contains_key("tag") => {
            serde_json::from_value(value).map_err(|e| e.to_string())
        }
        JsonValue::Object(_) => Err("an object root must be an element with a 'tag'".to_string()),
        other => Err(format!(
            "expected an array or object root, found {}",
            json_kind(other)
        )),
    }
}

/// Decode one node, naming the accepted shapes on failure.
pub fn node_from_value(value: JsonValue) -> Result<Node, String> {
    let kind = json_kind(&value);
    if !value.is_object() {
        return Err(format!("expected a node object, found {}", kind));
    }
    serde_json::from_value(value).map_err(|_| {
        concat!(
            "not a node: expected an element {\"tag\": ...}, ",
            "a component {\"component\": ...} or a text node {\"textKey\": ...}"
        )
        .to_string()
    })
}

/// Parse a node from JSON text.
pub fn parse_node(text: &str) -> Result<Node, String> {
    let value: JsonValue = serde_json::from_str(text).map_err(|e| e.to_string())?;
    node_from_value(value)
}

/// Parse a structure from JSON text.
pub fn parse_structure(text: &str) -> Result<Structure, String> {
    let value: JsonValue = serde_json::from_str(text).map_err(|e| e.to_string())?;
    structure_from_value(value)
}

/// Decode a stored structure file.
pub fn decode_structure(id: &StructureId, bytes: &[u8]) -> Result<Structure, StoreError> {
    let decode_error = |message: String| StoreError::Decode {
        id: id.clone(),
        message,
    };
    let value: JsonValue = serde_json::from_slice(bytes).map_err(|e| decode_error(e.to_string()))?;
    structure_from_value(value).map_err(decode_error)
}

/// Encode a structure as pretty-printed JSON with a trailing newline.
pub fn encode_structure(id: &StructureId, structure: &Structure) -> Result<Vec<u8>, StoreError> {
    let mut bytes = serde_json::to_vec_pretty(structure).map_err(|e| StoreError::Encode {
        id: id.clone(),
        message: e.to_string(),
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_both_root_shapes() {
        let page = decode_structure(&StructureId::Menu, br#"[{"tag": "a"}]"#).unwrap();
        assert_eq!(page, Structure::ArrayRoot(vec![Node::element("a")]));

        let id = StructureId::Component("card".to_string());
        let card = decode_structure(&id, br#"{"tag": "div", "children": []}"#).unwrap();
        assert!(card.root_element().is_some());
    }

    #[test]
    fn decode_errors_carry_the_id() {
        let err = decode_structure(&StructureId::Footer, b"42").unwrap_err();
        assert_eq!(
            err,
            StoreError::Decode {
                id: StructureId::Footer,
                message: "expected an array or object root, found a number".to_string()
            }
        );
        assert!(decode_structure(&StructureId::Footer, b"[").is_err());
    }

    #[test]
    fn bad_node_in_array_is_located() {
        let err = structure_from_value(json!([{"tag": "a"}, {"kind": "b"}])).unwrap_err();
        assert!(err.starts_with("node 1:"), "{}", err);
    }

    #[test]
    fn object_root_needs_a_tag() {
        assert!(structure_from_value(json!({"component": "card"})).is_err());
    }

    #[test]
    fn parse_node_shapes() {
        assert_eq!(parse_node(r#"{"textKey": "k"}"#).unwrap(), Node::text("k"));
        assert!(parse_node("[]").unwrap_err().contains("found an array"));
        assert!(parse_node(r#"{"href": "/"}"#).unwrap_err().starts_with("not a node"));
        assert!(parse_node("{").is_err());
    }

    #[test]
    fn encode_is_pretty_with_newline() {
        let s = Structure::ArrayRoot(vec![Node::element("p")]);
        let bytes = encode_structure(&StructureId::Menu, &s).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "[\n  {\n    \"tag\": \"p\"\n  }\n]\n");
    }
}
